//! Console output formatter for session views

use crate::output::formatter::OutputFormatter;
use crate::output::rotation_table::RotationTable;
use colored::{ColoredString, Colorize};
use dialogos_domain::{Role, SessionPhase, SessionView};

/// Formats session views for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one participant's view of a session
    pub fn format_view(view: &SessionView) -> String {
        let mut output = String::new();

        let viewer_name = view
            .participants
            .iter()
            .find(|p| p.id == view.viewer)
            .map(|p| p.display_name.as_str())
            .unwrap_or(view.viewer.as_str());

        output.push_str(&format!(
            "{} {} {}\n",
            format!("[{}]", viewer_name).cyan().bold(),
            view.phase.display_name().bold(),
            Self::round_label(view).dimmed()
        ));

        if !view.topic.is_empty() {
            output.push_str(&format!("  {} {}\n", "Topic:".cyan(), view.topic));
        }

        if let Some(role) = view.my_role {
            output.push_str(&format!("  {} {}\n", "You are:".cyan(), Self::role_label(role)));
        }

        if view.phase == SessionPhase::Initialization && !view.available_roles.is_empty() {
            let roles: Vec<&str> = view.available_roles.iter().map(|r| r.display_name()).collect();
            output.push_str(&format!("  {} {}\n", "Open roles:".cyan(), roles.join(", ")));
        }

        if view.phase == SessionPhase::TopicSelection && !view.topics.is_empty() {
            output.push_str(&format!("  {}\n", "Suggestions:".cyan()));
            for topic in &view.topics {
                output.push_str(&format!("    {:>2}  {}\n", topic.votes, topic.text));
            }
        }

        if let Some(remaining) = view.round_remaining {
            let secs = remaining.num_seconds().max(0);
            let clock = format!("{:02}:{:02}", secs / 60, secs % 60);
            if view.timer_frozen {
                output.push_str(&format!("  {} {} {}\n", "Time left:".cyan(), clock, "(paused)".yellow()));
            } else {
                output.push_str(&format!("  {} {}\n", "Time left:".cyan(), clock));
            }
        }

        if view.safety.active {
            let by = view
                .safety
                .requested_by
                .as_ref()
                .and_then(|id| view.participants.iter().find(|p| &p.id == id))
                .map(|p| p.display_name.as_str())
                .unwrap_or("someone");
            let mut line = format!("Safety pause requested by {}", by);
            if view.safety.can_end {
                line.push_str(" (you can end it)");
            }
            output.push_str(&format!("  {}\n", line.red().bold()));
            if view.safety.video_disabled {
                output.push_str(&format!("  {}\n", "Your camera is off".dimmed()));
            }
        }

        if let Some(group) = &view.my_subgroup {
            output.push_str(&format!(
                "  {} group {} ({})\n",
                "Continue in:".cyan(),
                group.index,
                group.session_id
            ));
        }

        if view.phase.is_round_phase() || view.phase == SessionPhase::Completion {
            for p in &view.participants {
                let role = p.role.map(Self::role_label).unwrap_or_else(|| "-".dimmed());
                let host = if p.is_host { " (host)" } else { "" };
                output.push_str(&format!("    {:<16} {}{}\n", p.display_name, role, host));
            }
        }

        if matches!(
            view.phase,
            SessionPhase::Completion | SessionPhase::FreeDialogue | SessionPhase::Reflection
        ) && !view.accumulated_scribe_notes.is_empty()
        {
            output.push_str(&format!("  {}\n", "Scribe notes:".cyan()));
            output.push_str(&Self::indent(&view.accumulated_scribe_notes, "    "));
            output.push('\n');
        }

        output
    }

    /// Format a rotation table with one column per round
    pub fn format_rotation(table: &RotationTable) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!(
            "Rotation: {} ({} rounds)",
            table.policy, table.total_rounds
        )));
        output.push('\n');

        let mut heading = format!("{:<8}", "");
        for round in 1..=table.total_rounds {
            heading.push_str(&format!("{:<12}", format!("Round {}", round)));
        }
        output.push_str(&format!("{}\n", heading.trim_end().bold()));

        for row in &table.seats {
            output.push_str(&format!("{:<8}", format!("Seat {}", row.seat)));
            for role in &row.roles {
                // Pad before colouring so escape codes don't skew the columns
                let cell = format!("{:<12}", role.display_name());
                output.push_str(&Self::paint(*role, &cell).to_string());
            }
            output.push('\n');
        }

        if table.passive_observer {
            output.push_str(&format!(
                "\n{} {}\n",
                "Passive observer:".dimmed(),
                "observes every round and never rotates".dimmed()
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    fn round_label(view: &SessionView) -> String {
        match (view.phase.is_round_phase(), view.total_rounds) {
            (true, Some(total)) => format!("round {}/{}", view.round, total),
            _ => String::new(),
        }
    }

    fn role_label(role: Role) -> ColoredString {
        Self::paint(role, role.display_name())
    }

    fn paint(role: Role, text: &str) -> ColoredString {
        match role {
            Role::Speaker => text.green().bold(),
            Role::Listener => text.blue().bold(),
            Role::Scribe => text.magenta(),
            Role::ObserverTemporary => text.yellow(),
            Role::ObserverPermanent => text.dimmed(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_view(&self, view: &SessionView) -> String {
        Self::format_view(view)
    }

    fn format_rotation(&self, table: &RotationTable) -> String {
        Self::format_rotation(table)
    }

    fn format_heading(&self, title: &str) -> String {
        format!("\n{}\n{}", title.cyan().bold(), "-".repeat(40))
    }
}
