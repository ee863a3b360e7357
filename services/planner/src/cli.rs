//! services/planner/src/cli.rs
//!
//! Command-line surface of the planner: argument definitions and the handlers
//! that drive the library and the lesson workflow.

use crate::{backup, error::AppError, render};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lesson_planner_core::{
    domain::{LessonId, SkillRating, StudentId, StudentProfile, StudentSkills},
    edit::LessonEdit,
    library::{Library, Outcome},
    ports::{Confirmation, LessonGenerator},
    workflow::{LessonWorkflow, WorkflowError},
};
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "planner", version, about = "Personalised ESL lesson planner")]
pub struct Cli {
    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage student profiles.
    #[command(subcommand)]
    Students(StudentCommand),
    /// Browse, generate and edit lessons.
    #[command(subcommand)]
    Lessons(LessonCommand),
    /// Export or restore a JSON backup.
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Delete every student and lesson.
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    List,
    Add(ProfileArgs),
    Update {
        id: String,
        #[command(flatten)]
        changes: ProfileChanges,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub interests: String,
    #[arg(long, default_value = "")]
    pub likes: String,
    #[arg(long, default_value = "")]
    pub dislikes: String,
    #[arg(long, default_value_t = 3)]
    pub speaking: i64,
    #[arg(long, default_value_t = 3)]
    pub listening: i64,
    #[arg(long, default_value_t = 3)]
    pub reading: i64,
    #[arg(long, default_value_t = 3)]
    pub writing: i64,
}

/// Fields left out keep their current value.
#[derive(Args, Debug, Default)]
pub struct ProfileChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub interests: Option<String>,
    #[arg(long)]
    pub likes: Option<String>,
    #[arg(long)]
    pub dislikes: Option<String>,
    #[arg(long)]
    pub speaking: Option<i64>,
    #[arg(long)]
    pub listening: Option<i64>,
    #[arg(long)]
    pub reading: Option<i64>,
    #[arg(long)]
    pub writing: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Student,
    #[default]
    Teacher,
}

impl From<ViewArg> for render::View {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Student => render::View::Student,
            ViewArg::Teacher => render::View::Teacher,
        }
    }
}

/// Review-step actions shared by `generate` and `edit`.
#[derive(Args, Debug, Default)]
pub struct ReviewArgs {
    /// Direct field edit, e.g. `student_book_content.new_words.0.english=ticket`.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,
    /// Instruction sent to the generator to rewrite the draft. Repeatable.
    #[arg(long = "refine", value_name = "INSTRUCTION")]
    pub refine: Vec<String>,
    /// Show the draft but do not save it.
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, value_enum, default_value_t = ViewArg::Teacher)]
    pub view: ViewArg,
}

#[derive(Subcommand, Debug)]
pub enum LessonCommand {
    List {
        #[arg(long)]
        student: Option<String>,
    },
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = ViewArg::Student)]
        view: ViewArg,
    },
    Delete {
        id: String,
    },
    Generate {
        #[arg(long)]
        student: String,
        #[arg(long)]
        topic: String,
        #[command(flatten)]
        review: ReviewArgs,
    },
    Edit {
        id: String,
        /// New topic for the saved lesson.
        #[arg(long)]
        topic: Option<String>,
        #[command(flatten)]
        review: ReviewArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    Export {
        /// Directory for the backup file. Defaults to BACKUP_DIR.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    Import {
        path: PathBuf,
    },
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Everything a command needs to run.
pub struct App {
    pub library: Library,
    pub generator: Arc<dyn LessonGenerator>,
    pub confirm: Box<dyn Confirmation>,
    pub backup_dir: PathBuf,
}

/// Runs one command and returns the text to print.
pub async fn execute(app: &mut App, command: Command) -> Result<String, AppError> {
    match command {
        Command::Students(cmd) => students(app, cmd).await,
        Command::Lessons(cmd) => lessons(app, cmd).await,
        Command::Backup(BackupCommand::Export { dir }) => {
            let dir = dir.unwrap_or_else(|| app.backup_dir.clone());
            let summary = backup::export_today(&app.library, &dir).await?;
            Ok(format!(
                "Exported {} students and {} lessons to {}",
                summary.students,
                summary.lessons,
                summary.path.display()
            ))
        }
        Command::Backup(BackupCommand::Import { path }) => {
            match backup::restore_from_file(&mut app.library, &path, app.confirm.as_ref()).await? {
                Outcome::Done => Ok("Data restored successfully!".to_string()),
                Outcome::Declined => Ok("Import cancelled.".to_string()),
            }
        }
        Command::Clear => match app.library.clear(app.confirm.as_ref()).await? {
            Outcome::Done => Ok("All data cleared.".to_string()),
            Outcome::Declined => Ok("Nothing was deleted.".to_string()),
        },
    }
}

fn profile_from(args: ProfileArgs) -> StudentProfile {
    StudentProfile {
        name: args.name,
        interests: args.interests,
        likes: args.likes,
        dislikes: args.dislikes,
        skills: StudentSkills {
            speaking: SkillRating::new(args.speaking),
            listening: SkillRating::new(args.listening),
            reading: SkillRating::new(args.reading),
            writing: SkillRating::new(args.writing),
        },
    }
}

fn merge_profile(mut profile: StudentProfile, changes: ProfileChanges) -> StudentProfile {
    if let Some(v) = changes.name {
        profile.name = v;
    }
    if let Some(v) = changes.interests {
        profile.interests = v;
    }
    if let Some(v) = changes.likes {
        profile.likes = v;
    }
    if let Some(v) = changes.dislikes {
        profile.dislikes = v;
    }
    let skills = &mut profile.skills;
    for (slot, change) in [
        (&mut skills.speaking, changes.speaking),
        (&mut skills.listening, changes.listening),
        (&mut skills.reading, changes.reading),
        (&mut skills.writing, changes.writing),
    ] {
        if let Some(v) = change {
            *slot = SkillRating::new(v);
        }
    }
    profile
}

fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Usage("A student needs a name.".to_string()));
    }
    Ok(())
}

async fn students(app: &mut App, cmd: StudentCommand) -> Result<String, AppError> {
    let library = &mut app.library;
    match cmd {
        StudentCommand::List => {
            let mut out = String::new();
            for student in library.students() {
                let count = library
                    .lessons()
                    .iter()
                    .filter(|l| l.student_id == student.id)
                    .count();
                let _ = writeln!(out, "{}", render::student_line(student, count));
            }
            if out.is_empty() {
                out.push_str("No students yet.\n");
            }
            Ok(out)
        }
        StudentCommand::Add(args) => {
            require_name(&args.name)?;
            let student = library.create_student(profile_from(args)).await?;
            Ok(format!("Added {} ({})", student.name, student.id))
        }
        StudentCommand::Update { id, changes } => {
            let id = StudentId::from(id.as_str());
            let current = library
                .student(&id)
                .map(|s| s.profile())
                .ok_or_else(|| AppError::Usage(format!("Student {id} not found")))?;
            let profile = merge_profile(current, changes);
            require_name(&profile.name)?;
            let resynced = library.update_student(&id, profile).await?;
            Ok(format!("Updated student {id}; {resynced} lesson(s) re-synced."))
        }
        StudentCommand::Delete { id } => {
            let id = StudentId::from(id.as_str());
            match library.delete_student(&id, app.confirm.as_ref()).await? {
                Outcome::Done => Ok(format!("Deleted student {id}.")),
                Outcome::Declined => Ok("Nothing was deleted.".to_string()),
            }
        }
    }
}

async fn lessons(app: &mut App, cmd: LessonCommand) -> Result<String, AppError> {
    match cmd {
        LessonCommand::List { student } => {
            let filter = student.map(|s| StudentId::from(s.as_str()));
            let mut out = String::new();
            for lesson in app
                .library
                .lessons()
                .iter()
                .filter(|l| filter.as_ref().map_or(true, |id| &l.student_id == id))
            {
                let _ = writeln!(out, "{}", render::lesson_line(lesson));
            }
            if out.is_empty() {
                out.push_str("No lessons yet.\n");
            }
            Ok(out)
        }
        LessonCommand::Show { id, view } => {
            let id = LessonId::from(id.as_str());
            let lesson = app
                .library
                .lesson(&id)
                .ok_or_else(|| AppError::Usage(format!("Lesson {id} not found")))?;
            Ok(render::lesson(&lesson.data, view.into()))
        }
        LessonCommand::Delete { id } => {
            let id = LessonId::from(id.as_str());
            match app.library.delete_lesson(&id, app.confirm.as_ref()).await? {
                Outcome::Done => Ok(format!("Deleted lesson {id}.")),
                Outcome::Declined => Ok("Nothing was deleted.".to_string()),
            }
        }
        LessonCommand::Generate {
            student,
            topic,
            review,
        } => {
            let edits = parse_edits(&review.set)?;
            let mut workflow = LessonWorkflow::new(Some(StudentId::from(student.as_str())));
            workflow.set_topic(topic)?;
            workflow
                .generate(app.generator.as_ref(), &app.library)
                .await
                .map_err(with_hint)?;
            finish_review(app, workflow, &edits, review).await
        }
        LessonCommand::Edit { id, topic, review } => {
            let id = LessonId::from(id.as_str());
            let edits = parse_edits(&review.set)?;
            let saved = app
                .library
                .lesson(&id)
                .ok_or_else(|| AppError::Usage(format!("Lesson {id} not found")))?;
            let mut workflow = LessonWorkflow::edit(saved);
            if let Some(topic) = topic {
                workflow.set_topic(topic)?;
            }
            finish_review(app, workflow, &edits, review).await
        }
    }
}

/// Folds the configuration hint into a generator failure message.
fn with_hint(e: WorkflowError) -> AppError {
    match e.configuration_hint() {
        Some(hint) => AppError::Usage(format!("{e}\n{hint}")),
        None => AppError::Workflow(e),
    }
}

/// Parses every `PATH=VALUE` assignment up front so bad input never costs a
/// generator call.
fn parse_edits(assignments: &[String]) -> Result<Vec<LessonEdit>, AppError> {
    assignments
        .iter()
        .map(|assignment| {
            let (path, value) = assignment.split_once('=').ok_or_else(|| {
                AppError::Usage(format!("Expected PATH=VALUE, got '{assignment}'"))
            })?;
            LessonEdit::from_assignment(path.trim(), value).map_err(|e| AppError::Usage(e.to_string()))
        })
        .collect()
}

async fn finish_review(
    app: &mut App,
    mut workflow: LessonWorkflow,
    edits: &[LessonEdit],
    review: ReviewArgs,
) -> Result<String, AppError> {
    for edit in edits {
        workflow.apply_edit(edit)?;
    }

    let mut out = String::new();
    for instruction in &review.refine {
        match workflow.refine(app.generator.as_ref(), instruction).await {
            Ok(_) => {
                if let Some(explanation) = workflow.last_explanation() {
                    let _ = writeln!(out, "AI: {explanation}");
                }
            }
            Err(e) => {
                // The draft is untouched.
                warn!(error = %e, instruction = %instruction, "Refinement failed; keeping the current draft.");
                let _ = writeln!(out, "Refinement failed: {e}");
                if let Some(hint) = e.configuration_hint() {
                    let _ = writeln!(out, "{hint}");
                }
                break;
            }
        }
    }

    if let Some(draft) = workflow.draft() {
        out.push_str(&render::lesson(draft, review.view.into()));
    }

    if review.dry_run {
        workflow.cancel();
        info!("Dry run; draft discarded.");
        out.push_str("\n(dry run, nothing saved)\n");
        return Ok(out);
    }

    let saved = workflow.approve(&mut app.library).await?;
    let _ = writeln!(out, "\nSaved lesson {} ({}).", saved.id, saved.topic);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_changes_only_the_given_fields() {
        let current = StudentProfile {
            name: "Ana".to_string(),
            interests: "Tech".to_string(),
            ..Default::default()
        };
        let merged = merge_profile(
            current,
            ProfileChanges {
                name: Some("Ana Maria".to_string()),
                speaking: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(merged.name, "Ana Maria");
        assert_eq!(merged.interests, "Tech");
        assert_eq!(merged.skills.speaking.get(), 5);
        assert_eq!(merged.skills.reading.get(), 3);
    }

    #[test]
    fn review_defaults_to_the_teacher_view_with_nothing_queued() {
        let review = ReviewArgs::default();
        assert_eq!(review.view, ViewArg::Teacher);
        assert!(review.set.is_empty() && review.refine.is_empty() && !review.dry_run);
    }

    #[test]
    fn edits_parse_up_front_and_reject_bad_assignments() {
        let edits = parse_edits(&["lesson_metadata.lesson_title=At the Airport".to_string()]).unwrap();
        assert_eq!(edits.len(), 1);
        assert!(matches!(parse_edits(&["no-equals".to_string()]), Err(AppError::Usage(_))));
    }

    #[test]
    fn cli_parses_repeated_review_flags() {
        let cli = Cli::try_parse_from([
            "planner",
            "--yes",
            "lessons",
            "generate",
            "--student",
            "s1",
            "--topic",
            "Travel",
            "--refine",
            "simpler",
            "--refine",
            "add idioms",
            "--set",
            "lesson_metadata.lesson_number=4",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.yes);
        match cli.command {
            Command::Lessons(LessonCommand::Generate { topic, review, .. }) => {
                assert_eq!(topic, "Travel");
                assert_eq!(review.refine, vec!["simpler", "add idioms"]);
                assert_eq!(review.set.len(), 1);
                assert!(review.dry_run);
                assert_eq!(review.view, ViewArg::Teacher);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
