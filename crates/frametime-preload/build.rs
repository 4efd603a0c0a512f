//! Build script for frametime-preload
//!
//! Generates the compile-time defaults:
//! 1. Start with library defaults
//! 2. If FRAMETIME_CONFIG_RS env var is set, parse user's config file
//! 3. Merge user values over defaults (user wins)
//! 4. Generate OUT_DIR/frametime_defaults.rs
//!
//! Runtime environment variables still override whatever is baked in here.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration parameter definition
struct ConfigParam {
    name: &'static str,
    rust_type: &'static str,
    default_value: &'static str,
}

/// All configuration parameters with their defaults
const CONFIG_PARAMS: &[ConfigParam] = &[
    ConfigParam {
        name: "OUTPUT_PATH",
        rust_type: "&str",
        default_value: "\"/tmp/libframetime.out\"",
    },
    ConfigParam {
        name: "GPU_TIMING",
        rust_type: "bool",
        default_value: "true",
    },
    ConfigParam {
        name: "VERBOSE_GPU_CHECKS",
        rust_type: "bool",
        default_value: "false",
    },
    ConfigParam {
        name: "QUERY_SLOTS",
        rust_type: "usize",
        default_value: "5",
    },
    ConfigParam {
        name: "MIN_COUNTER_BITS",
        rust_type: "u32",
        default_value: "30",
    },
];

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = Path::new(&out_dir).join("frametime_defaults.rs");

    let mut config: HashMap<&str, String> = CONFIG_PARAMS
        .iter()
        .map(|p| (p.name, p.default_value.to_string()))
        .collect();

    if let Ok(user_path) = env::var("FRAMETIME_CONFIG_RS") {
        println!("cargo:rerun-if-changed={}", user_path);

        match fs::read_to_string(&user_path) {
            Ok(content) => {
                parse_and_merge(&content, &mut config);
                println!("cargo:warning=Using custom config: {}", user_path);
            }
            Err(e) => {
                println!(
                    "cargo:warning=Failed to read FRAMETIME_CONFIG_RS ({}): {}",
                    user_path, e
                );
            }
        }
    }

    println!("cargo:rerun-if-env-changed=FRAMETIME_CONFIG_RS");
    println!("cargo:rerun-if-changed=build.rs");

    let output = generate_config(&config);
    fs::write(&dest_path, output).expect("Failed to write merged config");
}

/// Parse user's config file and merge known values into config map
fn parse_and_merge(content: &str, config: &mut HashMap<&str, String>) {
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("//") || !line.starts_with("pub const ") {
            continue;
        }

        let Some((name, value)) = parse_const_line(line) else {
            continue;
        };

        match CONFIG_PARAMS.iter().find(|p| p.name == name) {
            Some(param) => {
                config.insert(param.name, value);
            }
            None => println!("cargo:warning=Unknown config parameter: {}", name),
        }
    }
}

/// Parse `pub const NAME: TYPE = VALUE;` into (name, value)
fn parse_const_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix("pub const ")?.trim();

    let colon_pos = rest.find(':')?;
    let name = rest[..colon_pos].trim().to_string();

    let eq_pos = rest.find('=')?;
    let semi_pos = rest.rfind(';').unwrap_or(rest.len());
    if semi_pos <= eq_pos {
        return None;
    }

    let value = rest[eq_pos + 1..semi_pos].trim().to_string();
    Some((name, value))
}

/// Generate the merged defaults file
fn generate_config(config: &HashMap<&str, String>) -> String {
    let mut output = String::new();

    output.push_str("// Auto-generated by build.rs - do not edit\n");
    output.push_str("// Defaults merged from library values");
    if env::var("FRAMETIME_CONFIG_RS").is_ok() {
        output.push_str(" and FRAMETIME_CONFIG_RS");
    }
    output.push_str("\n\n");

    for param in CONFIG_PARAMS {
        let value = config
            .get(param.name)
            .map(String::as_str)
            .unwrap_or(param.default_value);
        output.push_str(&format!(
            "pub const {}: {} = {};\n",
            param.name, param.rust_type, value
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_const_line() {
        let result = parse_const_line("pub const QUERY_SLOTS: usize = 8;");
        assert_eq!(result, Some(("QUERY_SLOTS".into(), "8".into())));

        let result = parse_const_line("pub const OUTPUT_PATH: &str = \"/var/tmp/ft.log\";");
        assert_eq!(
            result,
            Some(("OUTPUT_PATH".into(), "\"/var/tmp/ft.log\"".into()))
        );

        assert_eq!(parse_const_line("pub const BROKEN;"), None);
    }

    #[test]
    fn test_parse_and_merge() {
        let mut config: HashMap<&str, String> = HashMap::new();
        config.insert("QUERY_SLOTS", "5".into());
        config.insert("GPU_TIMING", "true".into());

        let user_config = r#"
            // Slow integrated GPU: keep more frames in flight
            pub const QUERY_SLOTS: usize = 8;
            pub const GPU_TIMING: bool = false;
            pub const NOT_A_PARAM: u8 = 1;
        "#;

        parse_and_merge(user_config, &mut config);

        assert_eq!(config.get("QUERY_SLOTS"), Some(&"8".to_string()));
        assert_eq!(config.get("GPU_TIMING"), Some(&"false".to_string()));
        assert!(!config.contains_key("NOT_A_PARAM"));
    }
}
