pub mod completions;
pub mod files;
pub mod man_pages;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
/// Changes were found and `--detailed-exitcode` was given.
pub const EXIT_CHANGES: u8 = 2;
pub const EXIT_MANIFEST_ERROR: u8 = 3;
pub const EXIT_CONFIG_ERROR: u8 = 4;
pub const EXIT_INPUT_ERROR: u8 = 5;
