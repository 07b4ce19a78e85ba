//! Plain-text rendering of standup reports
//!
//! Reports are sent as Slack messages, so each participant's entries are laid
//! out as a fixed-width table inside a code fence.

use crate::lang;
use crate::standup::{tag, Category, Standup, Updates};

/// Column width entries are wrapped at
pub const WRAP_WIDTH: usize = 68;

const BLOCK_SEPARATOR: &str = "\n \n";

/// Greedy word wrap with separate first-line and continuation indents
///
/// Words longer than a line are split across lines.
pub fn wrap(text: &str, width: usize, initial_indent: &str, subsequent_indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = initial_indent.to_string();
    let mut has_word = false;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let used = current.chars().count();
            let gap = usize::from(has_word);
            if used + gap + word.len() <= width {
                if has_word {
                    current.push(' ');
                }
                current.extend(word.iter());
                has_word = true;
                break;
            }
            if has_word {
                lines.push(std::mem::replace(&mut current, subsequent_indent.to_string()));
                has_word = false;
                continue;
            }
            // Word alone does not fit on an empty line
            let room = width.saturating_sub(used).max(1);
            let rest = word.split_off(room.min(word.len()));
            current.extend(word.iter());
            lines.push(std::mem::replace(&mut current, subsequent_indent.to_string()));
            if rest.is_empty() {
                break;
            }
            word = rest;
        }
    }

    if has_word {
        lines.push(current);
    }
    lines.join("\n")
}

/// Two-column table without an outer border and with a rule between rows
///
/// The label column is right-justified. Cells may span several lines.
pub fn table(rows: &[(&str, String)]) -> String {
    let label_width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    let body_width = rows
        .iter()
        .flat_map(|(_, body)| body.lines())
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);

    let rule = format!(
        "{}+{}",
        "-".repeat(label_width + 2),
        "-".repeat(body_width + 2)
    );

    let mut out: Vec<String> = Vec::new();
    for (index, (label, body)) in rows.iter().enumerate() {
        if index > 0 {
            out.push(rule.clone());
        }
        let body_lines: Vec<&str> = if body.is_empty() {
            vec![""]
        } else {
            body.lines().collect()
        };
        for (line_index, line) in body_lines.iter().enumerate() {
            let label = if line_index == 0 { *label } else { "" };
            out.push(format!(
                " {:>lw$} | {:<bw$} ",
                label,
                line,
                lw = label_width,
                bw = body_width
            ));
        }
    }
    out.join("\n")
}

/// One participant's section of a report
pub fn block(user_tag: &str, updates: &Updates) -> String {
    if updates.is_empty() {
        return format!("{}: {}", user_tag, lang::NONE);
    }

    let rows: Vec<(&str, String)> = Category::ALL
        .iter()
        .filter(|category| !updates.entries(**category).is_empty())
        .map(|category| {
            let body = updates
                .entries(*category)
                .iter()
                .map(|entry| wrap(entry, WRAP_WIDTH, "* ", "  "))
                .collect::<Vec<_>>()
                .join("\n");
            (category.label(), body)
        })
        .collect();

    format!("{}:```\n{}```", user_tag, table(&rows))
}

/// The full report for a standup, participants in enrollment order
pub fn publish(standup: &Standup) -> String {
    let mut blocks = vec![lang::standup_for(&standup.channel().name)];
    for user_id in standup.users() {
        let empty = Updates::new();
        let updates = standup.updates(user_id).unwrap_or(&empty);
        blocks.push(block(&tag(user_id), updates));
    }
    blocks.join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standup::Channel;

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap("wrote code", 68, "* ", "  "), "* wrote code");
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let wrapped = wrap("one two three four", 11, "* ", "  ");
        assert_eq!(wrapped, "* one two\n  three\n  four");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let wrapped = wrap("abcdefghij", 6, "* ", "  ");
        assert_eq!(wrapped, "* abcd\n  efgh\n  ij");
    }

    #[test]
    fn test_wrap_empty() {
        assert_eq!(wrap("   ", 68, "* ", "  "), "");
    }

    #[test]
    fn test_table_layout() {
        let rows = vec![
            ("Done", "* a".to_string()),
            ("Blocked", "* bb\n  cc".to_string()),
        ];
        let expected = [
            "    Done | * a  ",
            "---------+------",
            " Blocked | * bb ",
            "         |   cc ",
        ]
        .join("\n");
        assert_eq!(table(&rows), expected);
    }

    #[test]
    fn test_block_none() {
        assert_eq!(block("<@U1>", &Updates::new()), "<@U1>: *None*");
    }

    #[test]
    fn test_publish_orders_by_enrollment() {
        let mut standup = Standup::new(Channel {
            id: "C1".to_string(),
            name: "dev".to_string(),
            members: vec![],
        });
        standup.add_user("U2");
        standup.add_user("U1");
        if let Some(updates) = standup.updates_mut("U1") {
            updates.push(Category::Done, "wrote code");
        }

        let report = publish(&standup);
        let blocks: Vec<&str> = report.split(BLOCK_SEPARATOR).collect();
        assert_eq!(blocks[0], "*Standup for dev*");
        assert_eq!(blocks[1], "<@U2>: *None*");
        assert!(blocks[2].starts_with("<@U1>:```\n"));
        assert!(blocks[2].contains("* wrote code"));
        assert!(blocks[2].ends_with("```"));
    }
}
