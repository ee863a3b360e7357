//! services/planner/src/render.rs
//!
//! Plain-text views of a lesson: the Student Book and the Teacher's Guide.

use lesson_planner_core::domain::{BilingualItem, DrillSection, LessonDocument, SavedLesson, Student};
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Student,
    Teacher,
}

fn bilingual(out: &mut String, heading: &str, items: &[BilingualItem]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for item in items {
        let _ = writeln!(out, "  - {} / {}", item.english, item.portuguese);
    }
}

fn bullets(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn drill(out: &mut String, heading: &str, section: &DrillSection) {
    let _ = writeln!(out, "\n{heading} ({}')", section.duration_minutes);
    for (i, sentence) in section.sentences.iter().enumerate() {
        let _ = writeln!(out, "  {}. {sentence}", i + 1);
    }
}

fn title(doc: &LessonDocument) -> String {
    let meta = &doc.lesson_metadata;
    match &meta.category {
        Some(category) => format!("Lesson {}: {} [{category}]", meta.lesson_number, meta.lesson_title),
        None => format!("Lesson {}: {}", meta.lesson_number, meta.lesson_title),
    }
}

pub fn student_book(doc: &LessonDocument) -> String {
    let book = &doc.student_book_content;
    let mut out = title(doc);
    out.push('\n');
    bilingual(&mut out, "VERBS", &book.verbs_header);
    bilingual(&mut out, "NEW WORDS", &book.new_words);
    bilingual(&mut out, "USEFUL PHRASES", &book.useful_phrases);
    bullets(&mut out, "GRAMMAR", &book.grammar.topics);
    bilingual(&mut out, "GRAMMAR EXAMPLES", &book.grammar.examples);
    bilingual(&mut out, "REAL LIFE", &book.real_life);
    if !book.check_it_out.boxes.is_empty() {
        let _ = writeln!(out, "\nCHECK IT OUT!");
        for tip in &book.check_it_out.boxes {
            let _ = writeln!(out, "  [{}]", tip.title);
            for line in &tip.content {
                let _ = writeln!(out, "    {line}");
            }
        }
    }
    out
}

pub fn teachers_guide(doc: &LessonDocument) -> String {
    let guide = &doc.teachers_guide_content;
    let mut out = format!("{} - Teacher's Guide\n", title(doc));
    bullets(&mut out, "LEARNING OBJECTIVES", &guide.header_info.learning_objectives);
    bullets(&mut out, "GRAMMAR FOCUS", &guide.header_info.grammar_focus);

    let _ = writeln!(out, "\nASSESSMENT ({}')", guide.assessment.duration_minutes);
    for (i, q) in guide.assessment.questions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}\n     -> {}", i + 1, q.question, q.answer);
    }

    let drills = &guide.drills;
    drill(&mut out, "VERBS DRILL", &drills.verbs_drill);
    drill(&mut out, "NEW WORDS DRILL", &drills.new_words_drill);
    drill(&mut out, "USEFUL PHRASES DRILL", &drills.useful_phrases_drill);
    drill(&mut out, "GRAMMAR DRILL", &drills.grammar_drill);

    bullets(&mut out, "HOMEWORK", &guide.procedures.homework_instructions);
    bullets(&mut out, "SKILLS CHECK", &guide.procedures.skills_check.skills);
    out
}

pub fn lesson(doc: &LessonDocument, view: View) -> String {
    match view {
        View::Student => student_book(doc),
        View::Teacher => teachers_guide(doc),
    }
}

/// One line per saved lesson, as shown in the library list.
pub fn lesson_line(lesson: &SavedLesson) -> String {
    format!(
        "{}  {}  {}  ({})",
        lesson.id,
        lesson.created_at.format("%Y-%m-%d"),
        lesson.topic,
        lesson.profile_snapshot
    )
}

pub fn student_line(student: &Student, lesson_count: usize) -> String {
    let s = &student.skills;
    format!(
        "{}  {}  S{} L{} R{} W{}  {} lesson(s)",
        student.id,
        student.name,
        s.speaking.get(),
        s.listening.get(),
        s.reading.get(),
        s.writing.get(),
        lesson_count
    )
}
