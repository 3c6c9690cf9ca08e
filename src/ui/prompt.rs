use std::io::{self, Write};

/// Ask a yes/no question with a safe default of "no".
pub fn confirm(message: &str) -> bool {
    print!("{} [y/N]: ", message);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        eprintln!("Failed to read input");
        return false;
    }

    parse_confirmation(&input)
}

pub fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation() {
        assert!(parse_confirmation("y"));
        assert!(parse_confirmation("Y\n"));
        assert!(parse_confirmation("  yes  "));
        assert!(parse_confirmation("YES"));

        // Anything else is a "no"
        assert!(!parse_confirmation(""));
        assert!(!parse_confirmation("\n"));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("yep"));
        assert!(!parse_confirmation("q"));
    }
}
