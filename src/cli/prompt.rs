use std::io::{self, Write};

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let stdin = io::stdin();
    prompt_confirm_from(prompt, default, &mut stdin.lock(), &mut io::stdout())
}

/// Asks until the answer is y, n, or empty with a default. End of input counts
/// as "no".
pub fn prompt_confirm_from<R: io::BufRead, W: Write>(
    prompt: &str,
    default: Option<bool>,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    let mut line = String::new();

    loop {
        line.clear();

        match default {
            Some(true) => write!(output, "{} (Y/n): ", prompt)?,
            Some(false) | None => write!(output, "{} (y/N): ", prompt)?,
        }
        output.flush()?;

        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }

        match line.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(input: &str, default: Option<bool>) -> bool {
        let mut output = Vec::new();
        prompt_confirm_from("Sure?", default, &mut input.as_bytes(), &mut output).unwrap()
    }

    #[test]
    fn test_prompt_answers() {
        assert!(answer("y\n", Some(false)));
        assert!(!answer("N\n", Some(true)));
        assert!(answer("\n", Some(true)));
        assert!(!answer("\n", Some(false)));
        assert!(answer("maybe\n\ny\n", None));
        assert!(!answer("", None));
    }
}
