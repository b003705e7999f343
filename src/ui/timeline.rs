use crate::event::{MembershipChange, MessageModel, RedactionInfo, RenderIntent};
use crate::message::ConnectedEdges;
use crate::state::timeline::TimelineRow;
use crate::ui::colors::{self, ANSI_RESET};

/// Vertical padding (top, bottom) around a row, in points.
pub fn row_padding(intent: &RenderIntent) -> (f32, f32) {
    match intent {
        RenderIntent::Message(model) => {
            let edge = |e| if model.edges.contains(e) { 2.0 } else { 8.0 };
            (edge(ConnectedEdges::TOP), edge(ConnectedEdges::BOTTOM))
        }
        RenderIntent::Generic { .. } => (10.0, 0.0),
        RenderIntent::Redacted(_) | RenderIntent::MembershipChange(_) => (0.0, 0.0),
    }
}

/// `@alice:example.org` → `alice`.
pub fn sender_display(user_id: &str) -> &str {
    user_id
        .strip_prefix('@')
        .and_then(|s| s.split(':').next())
        .unwrap_or(user_id)
}

pub fn redaction_text(info: &RedactionInfo) -> String {
    let message = match info.sender.as_deref() {
        Some(sender) if sender == info.actor => "Message".to_owned(),
        Some(sender) => format!("Message from {}", sender_display(sender)),
        None => "Message".to_owned(),
    };
    match &info.reason {
        Some(reason) => format!("🗑 {message} removed by {}: {reason}", sender_display(&info.actor)),
        None => format!("🗑 {message} removed by {}", sender_display(&info.actor)),
    }
}

pub fn membership_text(change: &MembershipChange) -> String {
    let sender = change.sender.as_deref().map(sender_display);
    let user = change
        .affected_user
        .as_deref()
        .or(sender)
        .unwrap_or("Someone");
    match change.membership_state.as_str() {
        "join" => format!("{user} joined"),
        "leave" => format!("{user} left"),
        "invite" => match sender {
            Some(sender) if change.affected_user.is_some() => format!("{sender} invited {user}"),
            Some(sender) => format!("{sender} sent an invitation"),
            None => format!("{user} was invited"),
        },
        "ban" => format!("{user} was banned"),
        "knock" => format!("{user} asked to join"),
        "" => format!("{user} changed their membership"),
        other => format!("{user}: {other}"),
    }
}

fn message_lines(model: &MessageModel, body: &str, ansi: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(reply) = &model.reply {
        lines.push(format!("│ {}: {}", sender_display(&reply.sender), reply.preview));
    }

    let name = sender_display(&model.sender);
    let name = if ansi {
        format!("{}{name}{ANSI_RESET}", colors::ansi_fg(colors::sender_color(&model.sender)))
    } else {
        name.to_owned()
    };

    if model.is_emote() {
        lines.push(format!("* {name} {body}"));
    } else {
        if model.show_sender || model.reply.is_some() {
            match &model.timestamp {
                Some(ts) => lines.push(format!("{name}  {ts}")),
                None => lines.push(name),
            }
        }
        lines.extend(body.lines().map(str::to_owned));
    }

    if model.edited {
        if let Some(last) = lines.last_mut() {
            last.push_str(" (edited)");
        }
    }
    if !model.reactions.is_empty() {
        let summary: Vec<String> = model
            .reactions
            .iter()
            .map(|group| format!("{} {}", group.key, group.count()))
            .collect();
        lines.push(format!("[{}]", summary.join("  ")));
    }
    lines
}

/// Plain-text rendering of a row, one entry per output line.
pub fn row_lines(row: &TimelineRow, ansi: bool) -> Vec<String> {
    match &row.intent {
        RenderIntent::Message(model) => {
            let body = row.body.as_ref().map(|b| b.text()).unwrap_or_default();
            message_lines(model, &body, ansi)
        }
        RenderIntent::Redacted(info) => vec![redaction_text(info)],
        RenderIntent::MembershipChange(change) => vec![membership_text(change)],
        RenderIntent::Generic { text, .. } => text.lines().map(str::to_owned).collect(),
    }
}
