use ansi_term::{Colour, Style};
use chrono::NaiveDate;

use crate::{
    tracker::{
        history::{format_date_label, format_steps, HistoryEntry, HistoryStats},
        StepSummary,
    },
    utils::{
        percentage::{goal_progress, Percentage},
        time::date_to_key,
    },
};

const BAR_WIDTH: usize = 20;

pub fn print_status(summary: &StepSummary) {
    println!(
        "{}\t{} / {} steps",
        Style::new().bold().paint("Today"),
        format_steps(summary.current_steps),
        format_steps(summary.daily_goal)
    );
    println!(
        "{}\t{}",
        paint_bar(summary.progress),
        Percentage::from_progress(summary.progress)
    );
    if summary.remaining_steps == 0 {
        println!("{}", Colour::Green.bold().paint("Goal achieved!"));
    } else {
        println!("{} steps to go", summary.remaining_steps);
    }
    println!(
        "Background tracking: {}",
        if summary.background_tracking { "on" } else { "off" }
    );
}

pub fn print_history(history: &[HistoryEntry], goal: u64, today: NaiveDate) {
    if history.iter().all(|v| v.steps == 0) {
        println!("No history yet. Start walking to see your history");
        return;
    }

    for entry in history {
        let label = format_date_label(&date_to_key(entry.date), today);
        if entry.steps == 0 {
            println!("{label:<14}\t{:>8} steps", 0);
            continue;
        }
        let progress = goal_progress(entry.steps, goal);
        println!(
            "{label:<14}\t{:>8} steps\t{} of goal\t{}",
            format_steps(entry.steps),
            Percentage::from_progress(progress),
            paint_bar(progress)
        );
    }
}

pub fn print_stats(stats: &HistoryStats) {
    println!("Days\t{}", stats.days);
    println!("Total\t{}", format_steps(stats.total));
    println!("Average\t{}", format_steps(stats.average));
    println!("Max\t{}", format_steps(stats.max));
    println!("Min\t{}", format_steps(stats.min));
}

fn paint_bar(progress: f32) -> String {
    let colour = if progress >= 1. {
        Colour::Green
    } else {
        Colour::Yellow
    };
    colour.paint(progress_bar(progress, BAR_WIDTH)).to_string()
}

/// Text progress bar of `width` cells.
fn progress_bar(progress: f32, width: usize) -> String {
    let filled = ((progress.clamp(0., 1.) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
