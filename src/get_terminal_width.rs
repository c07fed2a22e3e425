use terminal_size::{terminal_size, Width};

/// The width of the terminal minus `margin`, for `--help` output;
/// 120 if not a terminal.
pub fn get_terminal_width(margin: usize) -> usize {
    match terminal_size() {
        Some((Width(w), _)) => usize::from(w).saturating_sub(margin).max(40),
        None => 120,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_width_is_usable() {
        assert!(get_terminal_width(4) >= 40);
    }
}
