//! `miniagi config`: print a starter configuration.

use miniagi_config::AppConfig;

pub fn show() {
    let path = AppConfig::config_dir().join("config.toml");
    println!("# {}", path.display());
    println!("{}", AppConfig::default_toml());
}

#[cfg(test)]
mod tests {
    use miniagi_config::AppConfig;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.ends_with(".miniagi/config.toml"));
    }

    #[test]
    fn starter_config_parses_back() {
        let parsed: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert!(parsed.validate().is_ok());
    }
}
