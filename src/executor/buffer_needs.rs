//! Оценка числа буферов, доступных оператору

/// Буферы, которые оператор всегда оставляет под вход и выход
const RESERVED_BUFFERS: usize = 2;

/// Наибольший делитель `k = ceil(size / i)`, помещающийся в доступные буферы.
///
/// Используется операторами, которые читают вход порциями по `k` блоков.
pub fn best_factor(available: usize, size: usize) -> usize {
    let avail = available.saturating_sub(RESERVED_BUFFERS);
    if avail <= 1 {
        return 1;
    }
    let mut k = size;
    let mut i = 1_usize;
    while k > avail {
        i += 1;
        k = size.div_ceil(i);
    }
    k.max(1)
}
