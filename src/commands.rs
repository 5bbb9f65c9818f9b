/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "jobs",
    aliases: &["j", "job"],
    description: "Dispatch board of jobs",
  },
  Command {
    name: "agents",
    aliases: &["a", "agent", "availability"],
    description: "Field agents and availability",
  },
  Command {
    name: "invoices",
    aliases: &["i", "invoice", "billing"],
    description: "Agent and supplier invoices",
  },
  Command {
    name: "expenses",
    aliases: &["x", "expense"],
    description: "Logged expenses",
  },
  Command {
    name: "analytics",
    aliases: &["stats", "summary"],
    description: "Totals and completion rate",
  },
  Command {
    name: "clear-cache",
    aliases: &["cc"],
    description: "Forget every cached response",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit fieldops",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  // Lower rank sorts first
  let rank = |cmd: &Command| -> Option<u32> {
    if cmd.name == input_lower {
      Some(0)
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      Some(1)
    } else if cmd.name.starts_with(&input_lower) {
      Some(2)
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      Some(3)
    } else if cmd.name.contains(&input_lower) {
      Some(4)
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      Some(5)
    } else {
      None
    }
  };

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd).map(|r| (cmd, r)))
    .collect();
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("invoices");
    assert_eq!(suggestions[0].name, "invoices");
  }

  #[test]
  fn test_alias_match_beats_prefix() {
    // "a" is an alias of agents and a prefix of analytics
    let suggestions = get_suggestions("a");
    assert_eq!(suggestions[0].name, "agents");
    assert!(suggestions.iter().any(|c| c.name == "analytics"));
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("exp");
    assert_eq!(suggestions[0].name, "expenses");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("voic");
    assert_eq!(suggestions[0].name, "invoices");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
