// Build identity from Cargo.toml

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const NAME: &str = env!("CARGO_PKG_NAME");

/// "name vX.Y.Z", logged at startup.
pub fn banner() -> String {
    format!("{NAME} v{VERSION}")
}

#[cfg(test)]
mod tests {
    #[test]
    fn banner_names_the_package() {
        assert_eq!(super::banner(), format!("magneto v{}", super::VERSION));
    }
}
