//! Terminal prompting primitives for the interactive workflows.
//!
//! A [`Console`] wraps an input and an output stream so every prompt loop can
//! be driven by scripted input in tests.  The real binary hands it locked
//! stdin/stdout and enables hidden reads (via `rpassword`) for secrets.
//!
//! The prompt shapes: single-letter menus ([`Console::command`]), numbered
//! pick-or-type choosers ([`Console::choose`]), bounded number entry
//! ([`Console::choose_number`]) and yes/no confirmation ([`Console::confirm`]).
//! All of them re-prompt until the user supplies valid input; end of input is
//! an error, never a hang.

use std::io::{self, BufRead, Write};

use skiff_config::{ConfigError, PasswordPrompt, Result};

/// Paired input/output streams for interactive prompting.
pub struct Console<'a> {
    pub input: &'a mut dyn BufRead,
    pub output: &'a mut dyn Write,
    /// Read secrets from the controlling terminal with echo disabled.
    /// Scripted tests leave this off and supply secrets as plain lines.
    hidden_secrets: bool,
}

impl<'a> Console<'a> {
    /// Console for the real terminal: secrets are read with echo disabled.
    pub fn terminal(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Self {
            input,
            output,
            hidden_secrets: true,
        }
    }

    /// Console over arbitrary streams; secrets are read as plain lines.
    pub fn scripted(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Self {
            input,
            output,
            hidden_secrets: false,
        }
    }

    /// Print `prompt` (no newline), flush, and read one trimmed line.
    pub fn prompt_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(ConfigError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of input while prompting",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Single-letter menu.  Each entry is the letter followed by its label,
    /// e.g. `"qQuit config"`.  Loops until one of the letters is entered.
    pub fn command(&mut self, commands: &[&str]) -> Result<char> {
        let mut opts = Vec::with_capacity(commands.len());
        for text in commands {
            let mut chars = text.chars();
            if let Some(letter) = chars.next() {
                writeln!(self.output, "{}) {}", letter, chars.as_str())?;
                opts.push(letter);
            }
        }
        let opt_help = opts.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("/");
        loop {
            let result = self.prompt_line(&format!("{opt_help}> "))?.to_lowercase();
            let mut chars = result.chars();
            if let (Some(choice), None) = (chars.next(), chars.next()) {
                if opts.contains(&choice) {
                    return Ok(choice);
                }
            }
        }
    }

    /// Ask for Yes or No.  `auto` short-circuits to yes without prompting.
    pub fn confirm(&mut self, auto: bool) -> Result<bool> {
        if auto {
            return Ok(true);
        }
        Ok(self.command(&["yYes", "nNo"])? == 'y')
    }

    /// Numbered chooser over `defaults`, with optional per-value help lines.
    /// With `new_ok` the user may type a value of their own instead of a
    /// number; otherwise only listed values are accepted.
    pub fn choose(
        &mut self,
        what: &str,
        defaults: &[String],
        help: Option<&[String]>,
        new_ok: bool,
    ) -> Result<String> {
        let kind = if new_ok { "your own" } else { "an existing" };
        writeln!(self.output, "Choose a number from below, or type in {kind} value")?;
        for (i, text) in defaults.iter().enumerate() {
            let mut lines: Vec<String> = Vec::new();
            if let Some(help) = help {
                lines.extend(help[i].split('\n').map(str::to_string));
            }
            lines.push(format!("{text:?}"));
            let pos = i + 1;
            if lines.len() == 1 {
                writeln!(self.output, "{pos:2} > {text}")?;
            } else {
                let mid = (lines.len() - 1) / 2;
                for (j, line) in lines.iter().enumerate() {
                    let sep = if j == 0 {
                        '/'
                    } else if j == lines.len() - 1 {
                        '\\'
                    } else {
                        '|'
                    };
                    if j == mid {
                        writeln!(self.output, "{pos:2} {sep} {line}")?;
                    } else {
                        writeln!(self.output, "   {sep} {line}")?;
                    }
                }
            }
        }
        loop {
            let result = self.prompt_line(&format!("{what}> "))?;
            match result.parse::<usize>() {
                Ok(i) if (1..=defaults.len()).contains(&i) => return Ok(defaults[i - 1].clone()),
                Ok(_) => continue,
                Err(_) => {
                    if new_ok {
                        return Ok(result);
                    }
                    if defaults.iter().any(|v| *v == result) {
                        return Ok(result);
                    }
                }
            }
        }
    }

    /// Ask for a number between `min` and `max` inclusive.
    pub fn choose_number(&mut self, what: &str, min: i64, max: i64) -> Result<i64> {
        loop {
            let result = self.prompt_line(&format!("{what}> "))?;
            match result.parse::<i64>() {
                Err(e) => writeln!(self.output, "Bad number: {e}")?,
                Ok(i) if i < min || i > max => {
                    writeln!(self.output, "Out of range - {min} to {max} inclusive")?;
                }
                Ok(i) => return Ok(i),
            }
        }
    }

    /// Read one secret after echoing `prompt` on its own line.
    pub fn read_secret(&mut self, prompt: &str) -> Result<String> {
        writeln!(self.output, "{prompt}")?;
        if self.hidden_secrets {
            self.output.flush()?;
            Ok(rpassword::prompt_password("password:")?)
        } else {
            self.prompt_line("password:")
        }
    }
}

impl PasswordPrompt for Console<'_> {
    fn read_password(&mut self, prompt: &str) -> Result<String> {
        self.read_secret(prompt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
