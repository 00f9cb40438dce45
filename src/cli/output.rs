use ansi_term::{Colour, Style};

use crate::{
    analysis::Summary,
    model::{entry::StudyEntry, subject::Subject},
    utils::time::format_minutes,
};

const BAR_WIDTH: usize = 30;

pub fn print_entries(entries: &[StudyEntry]) {
    if entries.is_empty() {
        println!("No entries yet. Start a timer or add minutes manually.");
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{:>4}\t{}\t{}\t{}\t{}\t{}",
            index + 1,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            format_minutes(entry.duration_minutes as u64),
            entry.method,
            entry.subject,
            entry.notes.as_deref().unwrap_or_default()
        );
    }
}

pub fn print_subjects<'a>(subjects: impl Iterator<Item = &'a Subject>) {
    for subject in subjects {
        println!("{}\t{}", subject.short_name(), subject);
    }
}

pub fn print_summary(summary: &Summary) {
    let bold = Style::new().bold();
    println!(
        "{} {}",
        bold.paint(format!("Studied on {}:", summary.date)),
        format_minutes(summary.day_minutes)
    );

    if summary.total_minutes == 0 {
        println!("Nothing recorded yet. Start studying to see your progress!");
        return;
    }

    let colour = if summary.progress.is_complete() {
        Colour::Green
    } else {
        Colour::Cyan
    };
    println!();
    println!("{}", bold.paint("Progress"));
    println!(
        "{} {} / {} ({})",
        colour.paint(summary.progress.bar(BAR_WIDTH)),
        format_minutes(summary.total_minutes),
        format_minutes(summary.goal_minutes),
        summary.progress
    );

    println!();
    println!("{}", bold.paint("By subject"));
    for usage in &summary.subjects {
        let share = usage.minutes as f64 / summary.total_minutes as f64 * 100.;
        println!(
            "{:>5.1}%\t{:>8}\t{}",
            share,
            format_minutes(usage.minutes),
            usage.subject
        );
    }
}
