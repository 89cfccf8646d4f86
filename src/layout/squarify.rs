use crate::geom::{div_or_zero, Rect};

/// One rectangle assigned by the partitioner, tagged with the weight's
/// position in the input slice.
#[derive(Debug, Clone, Copy)]
pub struct StripItem {
    pub index: usize,
    pub rect: Rect,
}

/// One row or column produced by a single greedy pass. `bounds` is the
/// rectangle the strip was carved from: its own band plus everything that
/// gets laid out after it.
#[derive(Debug, Clone)]
pub struct Strip {
    pub bounds: Rect,
    pub items: Vec<StripItem>,
}

#[derive(Debug, Clone, Copy)]
struct Element {
    index: usize,
    size: f32,
}

/// Partition `rect` into near-square sub-rectangles with areas proportional
/// to `sizes`, returned strip by strip in placement order.
///
/// Weights that are negative or non-finite count as zero. A zero weight sum
/// or degenerate rectangle yields zero-size rectangles, never non-finite
/// ones.
pub fn partition(sizes: &[f32], rect: Rect) -> Vec<Strip> {
    if sizes.is_empty() {
        return Vec::new();
    }

    let total: f32 = sizes.iter().filter(|s| s.is_finite() && **s > 0.0).sum();
    if total <= 0.0 || rect.area() <= 0.0 {
        tracing::warn!(
            "degenerate partition input (sum={}, rect={}x{}), emitting zero-size rects",
            total,
            rect.w,
            rect.h
        );
    }

    // Normalize so weights become areas inside `rect`.
    let scale = div_or_zero(rect.area(), total);
    let mut elements: Vec<Element> = sizes
        .iter()
        .enumerate()
        .map(|(index, &size)| Element {
            index,
            size: if size.is_finite() && size > 0.0 {
                size * scale
            } else {
                0.0
            },
        })
        .collect();
    // Stable sort keeps equal weights in input order.
    elements.sort_by(|a, b| b.size.total_cmp(&a.size));

    let mut strips = Vec::new();
    let mut remaining = rect;
    let mut start = 0;
    while start < elements.len() {
        let (strip, leftover) = grow_strip(&elements[start..], remaining);
        start += strip.items.len();
        strips.push(strip);
        remaining = leftover;
    }
    strips
}

/// Flat result of [`partition`]: one rectangle per input weight, re-sorted
/// to input order.
pub fn partition_rects(sizes: &[f32], rect: Rect) -> Vec<Rect> {
    let mut rects = vec![Rect::ZERO; sizes.len()];
    for strip in partition(sizes, rect) {
        for item in strip.items {
            rects[item.index] = item.rect;
        }
    }
    rects
}

/// Take elements greedily while the worst aspect ratio does not get strictly
/// worse (ties favor inclusion), lay them out along the short axis, and
/// return the finished strip plus the leftover rectangle.
fn grow_strip(elements: &[Element], rect: Rect) -> (Strip, Rect) {
    let short = rect.w.min(rect.h);

    let mut count = 1;
    let mut sum = elements[0].size;
    let mut ratio = worst_aspect_ratio(&elements[..count], sum, short);
    while count < elements.len() {
        let next_sum = sum + elements[count].size;
        let next = worst_aspect_ratio(&elements[..count + 1], next_sum, short);
        if ratio >= next {
            count += 1;
            sum = next_sum;
            ratio = next;
        } else {
            break;
        }
    }

    let items = lay_out(&elements[..count], sum, rect);
    (
        Strip {
            bounds: rect,
            items,
        },
        leftover(sum, rect),
    )
}

/// Place a strip along the short axis of `rect`: a wide rectangle gets a
/// vertical band of stacked items at its left edge, a tall one a horizontal
/// band along its top.
fn lay_out(elements: &[Element], sum: f32, rect: Rect) -> Vec<StripItem> {
    let mut items = Vec::with_capacity(elements.len());
    if rect.w > rect.h {
        let band = div_or_zero(sum, rect.h);
        let mut y = rect.y;
        for e in elements {
            let h = div_or_zero(e.size, band);
            items.push(StripItem {
                index: e.index,
                rect: Rect::new(rect.x, y, band, h),
            });
            y += h;
        }
    } else {
        let band = div_or_zero(sum, rect.w);
        let mut x = rect.x;
        for e in elements {
            let w = div_or_zero(e.size, band);
            items.push(StripItem {
                index: e.index,
                rect: Rect::new(x, rect.y, w, band),
            });
            x += w;
        }
    }
    items
}

/// What is left of `rect` once a strip of total area `sum` has consumed its
/// band along the long axis.
fn leftover(sum: f32, rect: Rect) -> Rect {
    if rect.w > rect.h {
        let band = div_or_zero(sum, rect.h);
        Rect::new(rect.x + band, rect.y, (rect.w - band).max(0.0), rect.h)
    } else {
        let band = div_or_zero(sum, rect.w);
        Rect::new(rect.x, rect.y + band, rect.w, (rect.h - band).max(0.0))
    }
}

/// Worst (largest) aspect ratio over all rectangles the candidate strip
/// would produce against the short side. With areas sorted descending the
/// extremes sit at the ends, so this is closed-form.
fn worst_aspect_ratio(elements: &[Element], sum: f32, short: f32) -> f32 {
    if elements.is_empty() || sum <= 0.0 || short <= 0.0 {
        return f32::MAX;
    }
    let max = elements[0].size;
    let min = elements[elements.len() - 1].size;
    let short_sq = short * short;
    let sum_sq = sum * sum;
    (short_sq * max / sum_sq).max(sum_sq / (short_sq * min))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn empty_input_yields_no_strips() {
        assert!(partition(&[], Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
        assert!(partition_rects(&[], Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn single_weight_fills_rect() {
        let rect = Rect::new(3.0, 5.0, 40.0, 20.0);
        let rects = partition_rects(&[123.0], rect);
        assert_eq!(rects.len(), 1);
        assert!((rects[0].x - rect.x).abs() < EPS);
        assert!((rects[0].y - rect.y).abs() < EPS);
        assert!((rects[0].w - rect.w).abs() < EPS);
        assert!((rects[0].h - rect.h).abs() < EPS);
    }

    #[test]
    fn areas_are_proportional_and_conserved() {
        let sizes = [5.0, 4.0, 3.0, 2.0, 1.0, 1.0];
        let rect = Rect::new(0.0, 0.0, 80.0, 45.0);
        let rects = partition_rects(&sizes, rect);

        let sum: f32 = sizes.iter().sum();
        let total_area: f32 = rects.iter().map(|r| r.area()).sum();
        assert!((total_area - rect.area()).abs() < rect.area() * 1e-4);

        for (size, r) in sizes.iter().zip(&rects) {
            let expected = size / sum * rect.area();
            assert!(
                (r.area() - expected).abs() < expected * 1e-3,
                "area {} for weight {size}, expected {expected}",
                r.area()
            );
        }
    }

    #[test]
    fn two_largest_share_first_strip() {
        // 6x4 rect, weights already summing to its area
        let strips = partition(&[6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0], Rect::new(0.0, 0.0, 6.0, 4.0));

        let first: Vec<usize> = strips[0].items.iter().map(|i| i.index).collect();
        assert_eq!(first, vec![0, 1]);
        // wide rect, so the strip is a vertical band sharing its width
        let a = strips[0].items[0].rect;
        let b = strips[0].items[1].rect;
        assert!((a.w - b.w).abs() < EPS);
        assert!((a.w - 3.0).abs() < EPS);
        assert!((a.h - 2.0).abs() < EPS);

        let mut total = 0.0;
        for strip in &strips {
            for item in &strip.items {
                assert!(item.rect.w > 0.0 && item.rect.h > 0.0);
                total += item.rect.area();
            }
        }
        assert!((total - 24.0).abs() < EPS);
    }

    #[test]
    fn equal_weights_tile_square_as_grid() {
        let rects = partition_rects(&[1.0, 1.0, 1.0, 1.0], Rect::new(0.0, 0.0, 2.0, 2.0));
        for r in &rects {
            assert!((r.w - 1.0).abs() < EPS);
            assert!((r.h - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn index_fidelity_under_internal_sort() {
        // ascending input forces the internal sort to reverse everything
        let sizes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let rect = Rect::new(0.0, 0.0, 30.0, 20.0);
        let rects = partition_rects(&sizes, rect);
        assert_eq!(rects.len(), sizes.len());
        // larger weight, larger rect, at matching positions
        for i in 1..sizes.len() {
            assert!(rects[i].area() > rects[i - 1].area());
        }
    }

    #[test]
    fn zero_area_rect_degrades_to_finite_zero_rects() {
        let rects = partition_rects(&[3.0, 1.0], Rect::new(0.0, 0.0, 0.0, 10.0));
        assert_eq!(rects.len(), 2);
        for r in rects {
            assert!(r.x.is_finite() && r.y.is_finite());
            assert!(r.w == 0.0 && r.h == 0.0);
        }
    }

    #[test]
    fn zero_and_negative_weights_get_zero_rects() {
        let rects = partition_rects(&[0.0, 5.0, -2.0], Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!((rects[1].area() - 100.0).abs() < EPS);
        assert_eq!(rects[0].area(), 0.0);
        assert_eq!(rects[2].area(), 0.0);
        for r in rects {
            assert!(r.w.is_finite() && r.h.is_finite());
        }
    }

    #[test]
    fn worst_ratio_covers_all_candidates() {
        // strip of 4 and 1 against short side 2: the small element dominates
        let elems = [
            Element { index: 0, size: 4.0 },
            Element { index: 1, size: 1.0 },
        ];
        let worst = worst_aspect_ratio(&elems, 5.0, 2.0);
        assert!((worst - 6.25).abs() < EPS);
        // a single square-ish element rates close to 1
        let one = [Element { index: 0, size: 4.0 }];
        assert!((worst_aspect_ratio(&one, 4.0, 2.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn growth_stops_before_strictly_worse_ratio() {
        // in a 100x100 square, 8/4/2/1 must split into one strip each:
        // joining any pair strictly worsens the worst aspect ratio
        let strips = partition(&[8.0, 4.0, 2.0, 1.0], Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(strips.len(), 4);
        for (i, strip) in strips.iter().enumerate() {
            assert_eq!(strip.items.len(), 1);
            assert_eq!(strip.items[0].index, i);
        }
    }
}
