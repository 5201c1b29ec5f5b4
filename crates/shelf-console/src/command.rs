use shelf_query::{FilterValue, SortDirection};

pub const HELP: &str = "\
commands:
  search [text]              set the search box (empty clears it)
  filter <key> <value>       set a filter
  unfilter <key>             clear a filter
  sort <key> [asc|desc]      sort by key; toggles direction without one
  page <n>                   jump to page n
  next | prev                move one page
  refresh                    fetch the current page again
  categories                 show the book categories (retries after a failure)
  help                       show this text
  quit                       exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Filter { key: String, value: FilterValue },
    Unfilter(String),
    Sort {
        key: String,
        direction: Option<SortDirection>,
    },
    Page(u32),
    Next,
    Prev,
    Refresh,
    Categories,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("not a page number: {0}")]
    InvalidPage(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "search" => Command::Search(rest.to_string()),
        "filter" => {
            let (key, value) = rest
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("filter <key> <value>"))?;
            Command::Filter {
                key: key.to_string(),
                value: FilterValue::parse(value.trim()),
            }
        }
        "unfilter" => match rest {
            "" => return Err(CommandError::Usage("unfilter <key>")),
            key => Command::Unfilter(key.to_string()),
        },
        "sort" => {
            let mut words = rest.split_whitespace();
            let key = words.next().ok_or(CommandError::Usage("sort <key> [asc|desc]"))?;
            let direction = match words.next() {
                None => None,
                Some("asc") => Some(SortDirection::Asc),
                Some("desc") => Some(SortDirection::Desc),
                Some(_) => return Err(CommandError::Usage("sort <key> [asc|desc]")),
            };
            Command::Sort {
                key: key.to_string(),
                direction,
            }
        }
        "page" => {
            let page = rest
                .parse()
                .map_err(|_| CommandError::InvalidPage(rest.to_string()))?;
            Command::Page(page)
        }
        "next" => Command::Next,
        "prev" => Command::Prev,
        "refresh" => Command::Refresh,
        "categories" => Command::Categories,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_keeps_inner_spaces() {
        assert_eq!(
            parse("search  the left hand ").unwrap(),
            Some(Command::Search("the left hand".into()))
        );
        assert_eq!(parse("search").unwrap(), Some(Command::Search(String::new())));
    }

    #[test]
    fn filter_values_are_typed() {
        assert_eq!(
            parse("filter isPremium true").unwrap(),
            Some(Command::Filter {
                key: "isPremium".into(),
                value: FilterValue::Bool(true),
            })
        );
        assert_eq!(
            parse("filter approvalStatus 1").unwrap(),
            Some(Command::Filter {
                key: "approvalStatus".into(),
                value: FilterValue::Int(1),
            })
        );
        assert_eq!(
            parse("filter filter").unwrap_err(),
            CommandError::Usage("filter <key> <value>")
        );
    }

    #[test]
    fn sort_direction_is_optional() {
        assert_eq!(
            parse("sort title").unwrap(),
            Some(Command::Sort {
                key: "title".into(),
                direction: None,
            })
        );
        assert_eq!(
            parse("sort createdat desc").unwrap(),
            Some(Command::Sort {
                key: "createdat".into(),
                direction: Some(SortDirection::Desc),
            })
        );
        assert!(matches!(parse("sort title up"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn page_must_be_a_number() {
        assert_eq!(parse("page 3").unwrap(), Some(Command::Page(3)));
        assert_eq!(
            parse("page three").unwrap_err(),
            CommandError::InvalidPage("three".into())
        );
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(
            parse("delete b-1").unwrap_err(),
            CommandError::Unknown("delete".into())
        );
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
    }
}
