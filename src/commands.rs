/// Shell command table, suggestions and line splitting

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All commands the shell understands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "contact",
    aliases: &["c", "contact-us"],
    description: "Contact details (show) and the contact form (send)",
  },
  Command {
    name: "email",
    aliases: &["e", "mail"],
    description: "Admin email settings: status, toggle, test",
  },
  Command {
    name: "cache",
    aliases: &["stats"],
    description: "Response cache: stats, clear [pattern]",
  },
  Command {
    name: "session",
    aliases: &["s", "login", "logout"],
    description: "Admin session: login --token, logout",
  },
  Command {
    name: "route-test",
    aliases: &["route", "rt"],
    description: "Show how a location is split up",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Leave the shell",
  },
];

/// Rank of `input` against a command, lower is better.
fn rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Get suggestions for a given input, best first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input_lower).map(|r| (cmd, r)))
    .collect();

  // Stable, so equal ranks keep table order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve an exact name or alias to its command.
pub fn resolve(word: &str) -> Option<&'static Command> {
  let word = word.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == word || cmd.aliases.contains(&word.as_str()))
}

/// Split a shell line into words. Double quotes group words and a
/// backslash escapes the next character.
pub fn split_line(line: &str) -> Result<Vec<String>, String> {
  let mut words = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut quoted = false;
  let mut chars = line.chars();

  while let Some(c) = chars.next() {
    match c {
      '\\' => match chars.next() {
        Some(next) => {
          current.push(next);
          in_word = true;
        }
        None => return Err("Trailing backslash".to_string()),
      },
      '"' => {
        quoted = !quoted;
        in_word = true;
      }
      c if c.is_whitespace() && !quoted => {
        if in_word {
          words.push(std::mem::take(&mut current));
          in_word = false;
        }
      }
      c => {
        current.push(c);
        in_word = true;
      }
    }
  }

  if quoted {
    return Err("Unterminated quote".to_string());
  }
  if in_word {
    words.push(current);
  }
  Ok(words)
}
