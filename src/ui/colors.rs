use colored::Colorize;

/// Success message (green ✓)
pub fn success(msg: &str, colored: bool) {
    if colored {
        println!("{} {}", "✓".green().bold(), msg.green());
    } else {
        println!("✓ {}", msg);
    }
}

/// Error message on stderr (red ✗)
pub fn error(msg: &str, colored: bool) {
    if colored {
        eprintln!("{} {}", "✗".red().bold(), msg.red());
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Warning message (yellow ⚠)
pub fn warning(msg: &str, colored: bool) {
    if colored {
        println!("{} {}", "⚠".yellow().bold(), msg.yellow());
    } else {
        println!("⚠ {}", msg);
    }
}

/// Info message (blue ℹ), returned for the caller to print
pub fn info(msg: &str, colored: bool) -> String {
    if colored {
        format!("{} {}", "ℹ".blue().bold(), msg.blue())
    } else {
        format!("ℹ {}", msg)
    }
}

/// Step hint (grey)
pub fn step(step: &str, msg: &str, colored: bool) {
    if colored {
        println!(
            "{} {}",
            format!("[{}]", step).bright_black().bold(),
            msg.bright_black()
        );
    } else {
        println!("[{}] {}", step, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_plain() {
        assert_eq!(info("listening", false), "ℹ listening");
    }

    #[test]
    fn test_info_colored_keeps_text() {
        colored::control::set_override(true);
        let rendered = info("listening", true);
        colored::control::unset_override();
        assert!(rendered.contains("listening"));
        assert_ne!(rendered, "ℹ listening");
    }
}
