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
    name: "properties",
    aliases: &["p", "prop", "property"],
    description: "Managed properties",
  },
  Command {
    name: "leases",
    aliases: &["l", "lease"],
    description: "Active and past leases",
  },
  Command {
    name: "tenants",
    aliases: &["t", "tenant"],
    description: "Tenant directory",
  },
  Command {
    name: "invoices",
    aliases: &["inv", "rent"],
    description: "Rent invoices",
  },
  Command {
    name: "expenses",
    aliases: &["x", "expense", "costs"],
    description: "Property expenses",
  },
  Command {
    name: "maintenance",
    aliases: &["m", "repairs", "requests"],
    description: "Maintenance requests",
  },
  Command {
    name: "team",
    aliases: &["members"],
    description: "Owner team members",
  },
  Command {
    name: "invitations",
    aliases: &["invites"],
    description: "Pending team invitations",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit rentdesk",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  // Stable, so ties keep COMMANDS order
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
    let suggestions = get_suggestions("leases");
    assert_eq!(suggestions[0].name, "leases");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "inv" is an alias of invoices and a prefix of invitations
    let suggestions = get_suggestions("inv");
    assert_eq!(suggestions[0].name, "invoices");
    assert_eq!(suggestions[1].name, "invitations");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("maint");
    assert_eq!(suggestions[0].name, "maintenance");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("nant");
    assert_eq!(suggestions[0].name, "tenants");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
