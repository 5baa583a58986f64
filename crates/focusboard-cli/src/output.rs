//! Terminal output formatting.

use chrono::{DateTime, Local, NaiveDate, Utc};
use colored::{ColoredString, Colorize};
use unicode_width::UnicodeWidthStr;

use focusboard_core::board::{Board, BoardSummary, Card, Label, List, Priority};
use focusboard_core::goals::{Goal, GoalProgress};
use focusboard_core::pomodoro::{FocusStats, StatsWindow};
use focusboard_core::reminders::Reminder;
use focusboard_core::teams::{Team, TeamRole};

/// Print boards as a table.
pub fn print_boards_table(boards: &[BoardSummary]) {
    if boards.is_empty() {
        println!(
            "{}",
            "No boards found. Create one with 'focusboard board create <title>'.".dimmed()
        );
        return;
    }

    println!("{:<6} {:<30} {:>6} {:>6}", "ID", "Title", "Lists", "Cards");
    println!("{}", "─".repeat(52));

    for board in boards {
        println!(
            "{:<6} {} {:>6} {:>6}",
            board.id.to_string().dimmed(),
            pad_right(&truncate_visual(&board.title, 30), 30),
            board.lists_count,
            board.cards_count
        );
    }

    println!();
    println!("{} board(s) total", boards.len());
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

fn list_header_plain(list: &List, max_width: usize) -> String {
    let full = format!("{} {}", list.title.to_uppercase(), list.cards.len());
    truncate_visual(&full, max_width)
}

fn priority_indicator(priority: Priority) -> ColoredString {
    match priority {
        Priority::Urgent => "!!".red().bold(),
        Priority::High => "! ".yellow(),
        Priority::Medium => "· ".dimmed(),
        Priority::Low => "  ".normal(),
    }
}

fn card_title_colored(card: &Card, title: &str, now: DateTime<Utc>) -> ColoredString {
    if card.completed {
        title.green().dimmed()
    } else if card.is_overdue(now) {
        title.red()
    } else if card.is_due_soon(now) {
        title.yellow()
    } else {
        title.normal()
    }
}

/// Print a board with its lists side by side, or stacked on narrow terminals.
pub fn print_board(board: &Board) {
    println!(
        "{} {}",
        board.title.cyan().bold(),
        format!("(#{})", board.id).dimmed()
    );
    if let Some(desc) = board.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", desc.dimmed());
    }
    println!();

    if board.lists.is_empty() {
        println!(
            "{}",
            "No lists yet. Add one with 'focusboard list create'.".dimmed()
        );
        return;
    }

    let width = term_width();
    if width < 60 || board.lists.len() * 14 > width {
        print_board_compact(board);
    } else {
        print_board_wide(board, width);
    }
}

fn print_board_wide(board: &Board, term_w: usize) {
    let now = Utc::now();
    let num_cols = board.lists.len();
    let available = term_w.saturating_sub(num_cols + 1);
    let col_width = (available / num_cols).clamp(12, 35);

    let rule = |left: &str, mid: &str, right: &str| {
        let mut line = String::from(left);
        for i in 0..num_cols {
            line.push_str(&"─".repeat(col_width));
            if i < num_cols - 1 {
                line.push_str(mid);
            }
        }
        line.push_str(right);
        println!("{}", line.dimmed());
    };

    rule("┌", "┬", "┐");

    print!("{}", "│".dimmed());
    for (i, list) in board.lists.iter().enumerate() {
        let header = list_header_plain(list, col_width);
        let padding = col_width.saturating_sub(UnicodeWidthStr::width(header.as_str()));
        let left_pad = padding / 2;
        print!(
            "{}{}{}",
            " ".repeat(left_pad),
            header.blue().bold(),
            " ".repeat(padding - left_pad)
        );
        if i < num_cols - 1 {
            print!("{}", "│".dimmed());
        }
    }
    println!("{}", "│".dimmed());

    rule("├", "┼", "┤");

    let max_cards = board.lists.iter().map(|l| l.cards.len()).max().unwrap_or(0);
    for row in 0..max_cards {
        print!("{}", "│".dimmed());
        for (i, list) in board.lists.iter().enumerate() {
            match list.cards.get(row) {
                Some(card) => {
                    let title_w = col_width.saturating_sub(3).max(1);
                    let title = pad_right(&truncate_visual(&card.title, title_w), title_w);
                    let indicator = if card.completed {
                        "✓ ".green()
                    } else {
                        priority_indicator(card.priority)
                    };
                    print!("{} {}", indicator, card_title_colored(card, &title, now));
                }
                None => print!("{}", " ".repeat(col_width)),
            }
            if i < num_cols - 1 {
                print!("{}", "│".dimmed());
            }
        }
        println!("{}", "│".dimmed());
    }

    rule("└", "┴", "┘");

    let total = board.card_count();
    let done = board
        .lists
        .iter()
        .flat_map(|l| l.cards.iter())
        .filter(|c| c.completed)
        .count();
    if total > 0 {
        println!(
            " {} {} cards {} {} done ({}%)",
            "■".cyan(),
            total.to_string().bold(),
            "·".dimmed(),
            done.to_string().green(),
            done * 100 / total
        );
    }
}

fn print_board_compact(board: &Board) {
    let now = Utc::now();
    for list in &board.lists {
        println!(
            " {} {} {}",
            "▸".dimmed(),
            list.title.blue().bold(),
            format!("#{} · {}", list.id, list.cards.len()).dimmed()
        );
        for card in &list.cards {
            println!(
                "   {} {} {}",
                priority_indicator(card.priority),
                card_title_colored(card, &card.title, now),
                format!("#{}", card.id).dimmed()
            );
        }
        println!();
    }
}

/// Print a single card.
pub fn print_card(card: &Card) {
    let now = Utc::now();
    println!(
        "{} {}",
        card.title.cyan().bold(),
        format!("(#{})", card.id).dimmed()
    );
    if let Some(desc) = card.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", desc);
    }
    println!("{}: {}", "Priority".bold(), card.priority.as_str());
    if let Some(list_id) = card.list_id {
        println!("{}: #{} at {}", "List".bold(), list_id, card.position);
    }
    if let Some(due) = card.due_date {
        let local = due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
        let styled = if card.is_overdue(now) {
            local.red()
        } else if card.is_due_soon(now) {
            local.yellow()
        } else {
            local.normal()
        };
        println!("{}: {}", "Due".bold(), styled);
    }
    if let Some(hours) = card.estimated_hours {
        println!("{}: {}h", "Estimate".bold(), hours);
    }
    if !card.labels.is_empty() {
        let names: Vec<String> = card.labels.iter().map(|l| l.name.clone()).collect();
        println!("{}: {}", "Labels".bold(), names.join(", "));
    }
    if card.completed {
        println!("{}", "✓ completed".green());
    }
    if !card.comments.is_empty() {
        println!();
        println!("{} ({})", "Comments".bold(), card.comments.len());
        for comment in &card.comments {
            let author = comment
                .author
                .as_ref()
                .map(|a| a.display_name())
                .unwrap_or_else(|| "unknown".to_string());
            let when = comment
                .created_at
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!(
                "  {} {} {}",
                author.cyan(),
                when.dimmed(),
                format!("#{}", comment.id).dimmed()
            );
            println!("    {}", comment.content);
        }
    }
}

/// Print labels.
pub fn print_labels(labels: &[Label]) {
    if labels.is_empty() {
        println!("{}", "No labels defined.".dimmed());
        return;
    }

    for label in labels {
        println!(
            "  {} {:<20} {}",
            "●".cyan(),
            label.name.bold(),
            format!("#{} {}", label.id, label.color).dimmed()
        );
    }
}

/// Print goals with their progress.
pub fn print_goals(goals: &[Goal], today: NaiveDate) {
    if goals.is_empty() {
        println!("{}", "No goals yet.".dimmed());
        return;
    }

    println!("{:<6} {:<30} {:<14} {:>8}", "ID", "Title", "Progress", "Cards");
    println!("{}", "─".repeat(62));

    for goal in goals {
        let bar = progress_bar(goal.progress_percentage, 10);
        let bar = match goal.progress() {
            GoalProgress::Completed => bar.green(),
            GoalProgress::AlmostDone => bar.yellow(),
            GoalProgress::InProgress => bar.cyan(),
            GoalProgress::NotStarted => bar.dimmed(),
        };
        let title = pad_right(&truncate_visual(&goal.title, 30), 30);
        let title = if goal.is_completed {
            title.green().dimmed()
        } else if goal.is_overdue(today) {
            title.red()
        } else {
            title.normal()
        };
        println!(
            "{:<6} {} {} {:>3}% {:>4}/{}",
            goal.id.to_string().dimmed(),
            title,
            bar,
            goal.progress_percentage.round() as u32,
            goal.completed_cards_count,
            goal.cards_count
        );
    }
}

fn role_colored(role: TeamRole) -> ColoredString {
    match role {
        TeamRole::Owner => role.as_str().magenta().bold(),
        TeamRole::Admin => role.as_str().yellow(),
        TeamRole::Member => role.as_str().normal(),
        TeamRole::Viewer => role.as_str().dimmed(),
    }
}

/// Print teams, one per line.
pub fn print_teams(teams: &[Team]) {
    if teams.is_empty() {
        println!("{}", "No teams yet.".dimmed());
        return;
    }

    println!("{:<6} {:<30} {:<16} {:>7}", "ID", "Name", "Owner", "Members");
    println!("{}", "─".repeat(62));

    for team in teams {
        let name = pad_right(&truncate_visual(&team.name, 30), 30);
        let owner = team
            .owner
            .as_ref()
            .map(|o| o.username.clone())
            .unwrap_or_default();
        let name = if team.is_active {
            name.normal()
        } else {
            name.dimmed()
        };
        println!(
            "{:<6} {} {} {:>7}",
            team.id.to_string().dimmed(),
            name,
            pad_right(&truncate_visual(&owner, 16), 16),
            team.member_count
        );
    }
}

/// Print a team with its members.
pub fn print_team(team: &Team) {
    println!(
        "{} {}",
        team.name.cyan().bold(),
        format!("(#{})", team.id).dimmed()
    );
    if let Some(desc) = team.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", desc);
    }
    if !team.is_active {
        println!("{}", "inactive".yellow());
    }
    println!();
    println!("{} ({})", "Members".bold(), team.member_count);
    for member in &team.members {
        println!(
            "  {:<6} {} {} {}",
            member.user.id.to_string().dimmed(),
            pad_right(&truncate_visual(&member.user.display_name(), 24), 24),
            pad_right(&member.user.email, 28).dimmed(),
            role_colored(member.role)
        );
    }
}

fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Print focus statistics.
pub fn print_focus_stats(stats: &FocusStats) {
    let row = |label: &str, window: &StatsWindow| {
        println!(
            "  {:<10} {} sessions {} {} focus {} {} min",
            label.bold(),
            window.total_sessions.to_string().cyan(),
            "·".dimmed(),
            window.work_sessions.to_string().green(),
            "·".dimmed(),
            window.total_minutes
        );
    };
    println!("{}", "Focus Statistics".bold());
    println!();
    row("Today", &stats.today);
    row("This week", &stats.this_week);
}

/// Print one reminder.
pub fn print_reminder(reminder: &Reminder) {
    let title = match reminder {
        Reminder::Overdue { .. } => reminder.title().red().bold(),
        Reminder::DueSoon { .. } => reminder.title().yellow().bold(),
        Reminder::DailySummary { .. } => reminder.title().cyan().bold(),
    };
    println!("{} {}", title, reminder.message());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_visual_respects_width() {
        assert_eq!(truncate_visual("short", 10), "short");
        let cut = truncate_visual("a very long card title", 10);
        assert_eq!(UnicodeWidthStr::width(cut.as_str()), 10);
        assert!(cut.ends_with(".."));
        assert_eq!(UnicodeWidthStr::width(truncate_visual("日本語のタイトル", 7).as_str()), 6);
    }

    #[test]
    fn test_pad_right_uses_visual_width() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(UnicodeWidthStr::width(pad_right("日本", 6).as_str()), 6);
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(140.0, 4), "████");
    }
}
