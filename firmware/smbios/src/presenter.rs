//! Boot screen line showing the machine's manufacturer and product.

use crate::DmiInfo;

/// Text screen the identification line is written to
pub trait TextConsole {
    /// Print `text` starting at `row`, `col`
    fn print_at(&mut self, row: usize, col: usize, text: &[u8]);
}

impl<C: TextConsole + ?Sized> TextConsole for &mut C {
    fn print_at(&mut self, row: usize, col: usize, text: &[u8]) {
        (**self).print_at(row, col, text);
    }
}

/// A boot screen shared behind a spinlock
impl<C: TextConsole> TextConsole for &spin::Mutex<C> {
    fn print_at(&mut self, row: usize, col: usize, text: &[u8]) {
        self.lock().print_at(row, col, text);
    }
}

/// Placement of the identification line
#[derive(Debug, Clone)]
pub struct PresenterConfig {
    /// Screen row
    pub row: usize,
    /// Screen width in columns
    pub screen_columns: usize,
}

impl PresenterConfig {
    /// Row used by the diagnostic screen layout
    pub const DMI_ROW: usize = 23;
    /// Standard text mode width
    pub const COLUMNS: usize = 80;

    /// Create default configuration
    pub const fn new() -> Self {
        Self { row: Self::DMI_ROW, screen_columns: Self::COLUMNS }
    }

    /// Columns of the two strings when centred together, one space apart
    ///
    /// Returns `None` unless both strings are non-empty.
    pub fn layout(&self, first_len: usize, second_len: usize) -> Option<(usize, usize)> {
        if first_len == 0 || second_len == 0 {
            return None;
        }
        let first_col = (self.screen_columns / 2).saturating_sub((first_len + second_len) / 2);
        Some((first_col, first_col + first_len + 1))
    }
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Print the manufacturer and product name centred on the configured row
///
/// Nothing is printed when no record was found or either string is missing.
/// Returns whether the line was printed.
pub fn print_smbios_startup_info<C: TextConsole>(console: &mut C, info: &DmiInfo<'_>, config: &PresenterConfig) -> bool {
    let Some(record) = info.record() else {
        return false;
    };
    let manufacturer = record.manufacturer().unwrap_or_default();
    let product = record.product_name().unwrap_or_default();

    match config.layout(manufacturer.len(), product.len()) {
        Some((manufacturer_col, product_col)) => {
            console.print_at(config.row, manufacturer_col, manufacturer);
            console.print_at(config.row, product_col, product);
            true
        }
        None => false,
    }
}
