use crate::braille::BrailleCanvas;

/// Bresenham line that only sets every `step`-th dot (step 1 = solid)
pub fn draw_line_stepped(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, step: usize) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;
    let step = step.max(1);
    let mut n = 0usize;

    loop {
        if n % step == 0 {
            canvas.set_pixel_signed(x, y);
        }
        n += 1;

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a circle outline with the midpoint algorithm (pulse and guide rings)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (x, y), (y, x), (-y, x), (-x, y),
            (-x, -y), (-y, -x), (y, -x), (x, -y),
        ] {
            canvas.set_pixel_signed(cx + px, cy + py);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line_stepped(&mut canvas, 0, 0, 9, 0, 1);
        assert!((0..10).all(|x| canvas.is_set(x, 0)));
        assert!(!canvas.is_set(0, 1));
    }

    #[test]
    fn test_stepped_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line_stepped(&mut canvas, 0, 0, 9, 0, 3);
        let set: Vec<usize> = (0..10).filter(|&x| canvas.is_set(x, 0)).collect();
        assert_eq!(set, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_ring(&mut canvas, 10, 10, 5);
        assert!(canvas.is_set(15, 10));
        assert!(canvas.is_set(10, 5));
        assert!(!canvas.is_set(10, 10));
    }
}
