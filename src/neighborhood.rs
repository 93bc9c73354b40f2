// Index and neighborhood helpers for a row-major cell array.

/// Calculates the 1D row-major index for `(x, y)`. Caller guarantees bounds.
#[inline(always)]
pub fn cell_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Calls `f` with each in-bounds Moore neighbor of `(x, y)`, excluding the cell itself.
/// Positions past the grid edge are skipped; there is no wrap-around.
#[inline(always)]
pub fn for_each_neighbor<F>(x: u32, y: u32, width: u32, height: u32, mut f: F)
where
    F: FnMut(u32, u32),
{
    let center_x = x as i64;
    let center_y = y as i64;

    for dy in -1..=1i64 {
        for dx in -1..=1i64 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let check_x = center_x + dx;
            let check_y = center_y + dy;

            if check_x >= 0 && check_x < width as i64 && check_y >= 0 && check_y < height as i64 {
                f(check_x as u32, check_y as u32);
            }
        }
    }
}

/// Counts the neighbors of `(x, y)` for which `pred` holds.
#[inline(always)]
pub fn count_neighbors<P>(x: u32, y: u32, width: u32, height: u32, mut pred: P) -> u8
where
    P: FnMut(u32, u32) -> bool,
{
    let mut count = 0;
    for_each_neighbor(x, y, width, height, |nx, ny| {
        if pred(nx, ny) {
            count += 1;
        }
    });
    count
}
