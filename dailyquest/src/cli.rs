//! Command-line front end.
//!
//! Validates user input, dispatches to [`QuestManager`] and renders plain
//! text. Output goes to any [`Write`] so commands can be exercised in tests.

use std::io::Write;

use chrono::Local;

use dailyquest_model::progress::Progress;
use dailyquest_model::quest::{
    Difficulty, MAX_DAILY_QUESTS, MAX_DETAILS_LENGTH, Priority, Quest, QuestInputError,
    truncate_details, validate_content,
};

use crate::config::AppConfig;
use crate::quests::{QuestError, QuestFilter, QuestManager, StatusFilter};
use crate::store::QuestStore;

/// Width of the text progress bar on the home screen.
const PROGRESS_BAR_WIDTH: usize = 20;

/// Errors surfaced by a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Manager or store failure.
    #[error(transparent)]
    Quest(#[from] QuestError),
    /// Invalid user input.
    #[error(transparent)]
    Input(#[from] QuestInputError),
    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Subcommands of the `dailyquest` binary.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show level, experience and today's daily missions.
    Home,
    /// Create a new quest.
    Add {
        /// Quest description.
        content: String,
        /// Priority: 1 (low), 2 (medium) or 3 (high).
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u8).range(1..=3)
        )]
        priority: u8,
        /// Difficulty: easy, normal or hard.
        #[arg(short, long, default_value = "normal")]
        difficulty: Difficulty,
        /// Free-form details (truncated to 200 characters).
        #[arg(long, default_value = "")]
        details: String,
    },
    /// List quests, optionally filtered.
    List {
        /// Only quests with this status.
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        /// Only quests with this priority (1-3).
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
        priority: Option<u8>,
        /// Only quests with this difficulty.
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
    /// Show one quest in full.
    Show {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Change a quest's description, priority, difficulty or details.
    Edit {
        /// Quest id or unique id prefix.
        id: String,
        /// New description.
        #[arg(long)]
        content: Option<String>,
        /// New priority (1-3).
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
        priority: Option<u8>,
        /// New difficulty.
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
        /// New details (truncated to 200 characters).
        #[arg(long)]
        details: Option<String>,
    },
    /// Mark a quest completed and collect its experience.
    Complete {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Record a failed attempt.
    Fail {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Make a quest one of today's daily missions.
    Daily {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Remove a quest from the daily missions.
    Undaily {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Delete a quest permanently.
    Delete {
        /// Quest id or unique id prefix.
        id: String,
    },
    /// Show the statistics dashboard.
    Stats,
}

/// Runs `command` against `manager`, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns [`CliError`] on invalid input, manager/store failure, or when
/// writing to `out` fails.
pub fn execute<S: QuestStore, W: Write>(
    manager: &mut QuestManager<S>,
    command: &Command,
    config: &AppConfig,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Command::Home => render_home(manager, out)?,
        Command::Add {
            content,
            priority,
            difficulty,
            details,
        } => {
            validate_content(content)?;
            let priority = Priority::try_from(*priority)?;
            let details = clip_details(details, out)?;
            let id = manager.add_quest(content.as_str(), priority, *difficulty, details)?;
            let exp = manager.quest(&id).map_or(0, |q| q.exp);
            writeln!(out, "Added quest {id} ({exp} EXP)")?;
        }
        Command::List {
            status,
            priority,
            difficulty,
        } => {
            let filter = QuestFilter {
                status: *status,
                priority: priority.map(Priority::try_from).transpose()?,
                difficulty: *difficulty,
            };
            let quests = filter.apply(manager.quests());
            writeln!(out, "Quests ({})", quests.len())?;
            if quests.is_empty() {
                writeln!(out, "  No quests yet. Create one with `dailyquest add`.")?;
            }
            for quest in quests {
                writeln!(out, "  {}", quest_line(quest))?;
            }
        }
        Command::Show { id } => {
            let quest = manager.find_by_prefix(id)?;
            render_quest(quest, &config.date_format, out)?;
        }
        Command::Edit {
            id,
            content,
            priority,
            difficulty,
            details,
        } => {
            let quest = manager.find_by_prefix(id)?.clone();
            let content = content.clone().unwrap_or(quest.content);
            validate_content(&content)?;
            let priority = priority
                .map(Priority::try_from)
                .transpose()?
                .unwrap_or(quest.priority);
            let difficulty = difficulty.unwrap_or(quest.difficulty);
            let details = match details {
                Some(details) => clip_details(details, out)?,
                None => quest.details,
            };
            manager.edit_quest(&quest.id, content, priority, difficulty, details)?;
            writeln!(out, "Updated quest {}", quest.id)?;
        }
        Command::Complete { id } => {
            let quest = manager.find_by_prefix(id)?.clone();
            if quest.is_completed {
                writeln!(out, "Quest already completed: {}", quest.content)?;
                return Ok(());
            }
            manager.complete_quest(&quest.id)?;
            writeln!(out, "Quest complete! +{} EXP", quest.exp)?;
            if manager.show_level_up() {
                writeln!(out, "LEVEL UP! You reached level {}", manager.progress().level)?;
                manager.acknowledge_level_up();
            }
            writeln!(out, "{}", progress_line(&manager.progress()))?;
        }
        Command::Fail { id } => {
            let quest_id = manager.find_by_prefix(id)?.id.clone();
            manager.fail_quest(&quest_id)?;
            let fails = manager.quest(&quest_id).map_or(0, |q| q.fail_count);
            writeln!(out, "Recorded failure ({fails} total)")?;
        }
        Command::Daily { id } => {
            let quest = manager.find_by_prefix(id)?.clone();
            if quest.is_daily {
                writeln!(out, "Already a daily mission: {}", quest.content)?;
            } else if quest.is_completed {
                writeln!(out, "Completed quests cannot be daily missions: {}", quest.content)?;
            } else if !manager.can_set_daily(&quest.id) {
                writeln!(
                    out,
                    "Daily missions are full ({MAX_DAILY_QUESTS}/{MAX_DAILY_QUESTS})"
                )?;
            } else {
                manager.set_daily(&quest.id)?;
                writeln!(
                    out,
                    "Daily mission set ({}/{MAX_DAILY_QUESTS})",
                    manager.daily_quests().len()
                )?;
            }
        }
        Command::Undaily { id } => {
            let quest_id = manager.find_by_prefix(id)?.id.clone();
            manager.remove_daily(&quest_id)?;
            writeln!(out, "Removed from daily missions")?;
        }
        Command::Delete { id } => {
            let quest = manager.find_by_prefix(id)?.clone();
            manager.delete_quest(&quest.id)?;
            writeln!(out, "Deleted quest: {}", quest.content)?;
        }
        Command::Stats => render_stats(manager, out)?,
    }
    Ok(())
}

/// Truncates details to the allowed length, telling the user when it did.
fn clip_details<W: Write>(details: &str, out: &mut W) -> Result<String, CliError> {
    let clipped = truncate_details(details);
    if clipped.len() < details.len() {
        writeln!(out, "Details truncated to {MAX_DETAILS_LENGTH} characters")?;
    }
    Ok(clipped)
}

fn progress_bar(progress: &Progress) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (progress.ratio() * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn progress_line(progress: &Progress) -> String {
    format!(
        "Level {} {} {}/{} EXP",
        progress.level,
        progress_bar(progress),
        progress.current_exp,
        progress.exp_to_next_level
    )
}

fn quest_line(quest: &Quest) -> String {
    let check = if quest.is_completed { 'x' } else { ' ' };
    let daily = if quest.is_daily { " [daily]" } else { "" };
    let fails = if quest.fail_count > 0 {
        format!(", failed {}x", quest.fail_count)
    } else {
        String::new()
    };
    format!(
        "[{check}] {} {}{daily} ({}, {}, {} EXP{fails})",
        quest.id, quest.content, quest.priority, quest.difficulty, quest.exp
    )
}

fn render_home<S: QuestStore, W: Write>(
    manager: &QuestManager<S>,
    out: &mut W,
) -> Result<(), CliError> {
    writeln!(out, "{}", progress_line(&manager.progress()))?;
    writeln!(
        out,
        "Today's daily missions ({}/{MAX_DAILY_QUESTS})",
        manager.daily_quests().len()
    )?;
    if manager.daily_quests().is_empty() {
        writeln!(out, "  No daily missions. Pick one with `dailyquest daily <id>`.")?;
    }
    for quest in manager.daily_quests() {
        writeln!(out, "  {}", quest_line(quest))?;
    }
    Ok(())
}

fn render_quest<W: Write>(quest: &Quest, date_format: &str, out: &mut W) -> Result<(), CliError> {
    let created = quest.created_at.with_timezone(&Local).format(date_format);
    writeln!(out, "Quest      {}", quest.id)?;
    writeln!(out, "Content    {}", quest.content)?;
    writeln!(
        out,
        "Details    {}",
        if quest.details.is_empty() {
            "(none)"
        } else {
            &quest.details
        }
    )?;
    writeln!(out, "Priority   {}", quest.priority)?;
    writeln!(out, "Difficulty {}", quest.difficulty)?;
    writeln!(out, "EXP        {}", quest.exp)?;
    writeln!(
        out,
        "Status     {}",
        if quest.is_completed { "completed" } else { "open" }
    )?;
    writeln!(out, "Daily      {}", if quest.is_daily { "yes" } else { "no" })?;
    writeln!(out, "Failures   {}", quest.fail_count)?;
    writeln!(out, "Created    {created}")?;
    if let Some(done) = quest.completed_at {
        writeln!(
            out,
            "Completed  {}",
            done.with_timezone(&Local).format(date_format)
        )?;
    }
    Ok(())
}

fn render_stats<S: QuestStore, W: Write>(
    manager: &QuestManager<S>,
    out: &mut W,
) -> Result<(), CliError> {
    let summary = manager.summary();
    writeln!(out, "Level            {}", summary.level)?;
    writeln!(out, "Total EXP earned {}", summary.total_earned_exp)?;
    writeln!(out, "Completed        {}", summary.total_completed)?;
    writeln!(out, "Failures         {}", summary.total_failed)?;

    writeln!(out)?;
    writeln!(out, "Completed this week")?;
    for day in manager.weekly_completed_counts() {
        writeln!(out, "  {} {:>3} {}", day.weekday, day.count, "#".repeat(day.count))?;
    }

    writeln!(out)?;
    writeln!(out, "Completed by difficulty")?;
    for (difficulty, count) in manager.difficulty_completed_counts() {
        writeln!(out, "  {difficulty:<6} {count:>3} {}", "#".repeat(count))?;
    }

    let status = manager.status_breakdown();
    writeln!(out)?;
    writeln!(out, "Status")?;
    writeln!(out, "  completed  {}", status.completed)?;
    writeln!(out, "  incomplete {}", status.incomplete)?;
    writeln!(out, "  failed     {}", status.failed)?;
    Ok(())
}
