// Build identity, from Cargo.toml at compile time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Plain-text greeting served at `/`.
pub fn banner() -> String {
    format!("{NAME} {VERSION}: SAR metrics as normalized tables")
}
