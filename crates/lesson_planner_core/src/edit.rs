//! crates/lesson_planner_core/src/edit.rs
//!
//! Structural in-place edits of a lesson document. Every edit copies the
//! document, patches exactly one addressed leaf or list element, and hands back
//! the new copy; the input is never mutated.

use crate::domain::{BilingualItem, DrillSection, LessonDocument};
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("{list} has no item at index {index} (length {len})")]
    IndexOutOfRange {
        list: &'static str,
        index: usize,
        len: usize,
    },
    #[error("Unknown lesson field path: {0}")]
    UnknownPath(String),
    #[error("Field {path} expects a whole number, got {value:?}")]
    NotANumber { path: String, value: String },
}

//=========================================================================================
// Addressing
//=========================================================================================

/// Lists of bilingual items in the student book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BilingualList {
    Verbs,
    NewWords,
    UsefulPhrases,
    GrammarExamples,
    RealLife,
}

impl BilingualList {
    fn name(self) -> &'static str {
        match self {
            BilingualList::Verbs => "verbs_header",
            BilingualList::NewWords => "new_words",
            BilingualList::UsefulPhrases => "useful_phrases",
            BilingualList::GrammarExamples => "grammar.examples",
            BilingualList::RealLife => "real_life",
        }
    }

    fn items_mut(self, doc: &mut LessonDocument) -> &mut Vec<BilingualItem> {
        let book = &mut doc.student_book_content;
        match self {
            BilingualList::Verbs => &mut book.verbs_header,
            BilingualList::NewWords => &mut book.new_words,
            BilingualList::UsefulPhrases => &mut book.useful_phrases,
            BilingualList::GrammarExamples => &mut book.grammar.examples,
            BilingualList::RealLife => &mut book.real_life,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Portuguese,
}

/// Flat lists of plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextList {
    GrammarTopics,
    LearningObjectives,
    GrammarFocus,
    HomeworkInstructions,
    Skills,
}

impl TextList {
    fn name(self) -> &'static str {
        match self {
            TextList::GrammarTopics => "grammar.topics",
            TextList::LearningObjectives => "learning_objectives",
            TextList::GrammarFocus => "grammar_focus",
            TextList::HomeworkInstructions => "homework_instructions",
            TextList::Skills => "skills_check.skills",
        }
    }

    fn items_mut(self, doc: &mut LessonDocument) -> &mut Vec<String> {
        let guide = &mut doc.teachers_guide_content;
        match self {
            TextList::GrammarTopics => &mut doc.student_book_content.grammar.topics,
            TextList::LearningObjectives => &mut guide.header_info.learning_objectives,
            TextList::GrammarFocus => &mut guide.header_info.grammar_focus,
            TextList::HomeworkInstructions => &mut guide.procedures.homework_instructions,
            TextList::Skills => &mut guide.procedures.skills_check.skills,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drill {
    Verbs,
    NewWords,
    UsefulPhrases,
    Grammar,
}

impl Drill {
    fn name(self) -> &'static str {
        match self {
            Drill::Verbs => "verbs_drill",
            Drill::NewWords => "new_words_drill",
            Drill::UsefulPhrases => "useful_phrases_drill",
            Drill::Grammar => "grammar_drill",
        }
    }

    fn section_mut(self, doc: &mut LessonDocument) -> &mut DrillSection {
        let drills = &mut doc.teachers_guide_content.drills;
        match self {
            Drill::Verbs => &mut drills.verbs_drill,
            Drill::NewWords => &mut drills.new_words_drill,
            Drill::UsefulPhrases => &mut drills.useful_phrases_drill,
            Drill::Grammar => &mut drills.grammar_drill,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    Question,
    Answer,
}

/// Address of a single string leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPath {
    LessonTitle,
    Category,
    Bilingual {
        list: BilingualList,
        index: usize,
        language: Language,
    },
    ListItem {
        list: TextList,
        index: usize,
    },
    TipBoxTitle {
        index: usize,
    },
    TipBoxLine {
        index: usize,
        line: usize,
    },
    Assessment {
        index: usize,
        field: QuestionField,
    },
    DrillSentence {
        drill: Drill,
        index: usize,
    },
}

/// Address of a single numeric leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPath {
    LessonNumber,
    AssessmentDuration,
    DrillDuration(Drill),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LessonEdit {
    SetText { path: TextPath, value: String },
    SetNumber { path: NumberPath, value: i64 },
    ReplaceBilingual {
        list: BilingualList,
        index: usize,
        item: BilingualItem,
    },
}

//=========================================================================================
// Applying
//=========================================================================================

fn element<'a, T>(items: &'a mut [T], list: &'static str, index: usize) -> Result<&'a mut T, EditError> {
    let len = items.len();
    items
        .get_mut(index)
        .ok_or(EditError::IndexOutOfRange { list, index, len })
}

/// Returns a copy of `doc` with `edit` applied. `doc` itself is left as is.
pub fn apply_edit(doc: &LessonDocument, edit: &LessonEdit) -> Result<LessonDocument, EditError> {
    let mut next = doc.clone();
    match edit {
        LessonEdit::SetText { path, value } => *text_leaf(&mut next, *path)? = value.clone(),
        LessonEdit::SetNumber { path, value } => *number_leaf(&mut next, *path) = *value,
        LessonEdit::ReplaceBilingual { list, index, item } => {
            *element(list.items_mut(&mut next), list.name(), *index)? = item.clone();
        }
    }
    Ok(next)
}

fn text_leaf(doc: &mut LessonDocument, path: TextPath) -> Result<&mut String, EditError> {
    match path {
        TextPath::LessonTitle => Ok(&mut doc.lesson_metadata.lesson_title),
        TextPath::Category => Ok(doc.lesson_metadata.category.get_or_insert_with(String::new)),
        TextPath::Bilingual {
            list,
            index,
            language,
        } => {
            let item = element(list.items_mut(doc), list.name(), index)?;
            Ok(match language {
                Language::English => &mut item.english,
                Language::Portuguese => &mut item.portuguese,
            })
        }
        TextPath::ListItem { list, index } => element(list.items_mut(doc), list.name(), index),
        TextPath::TipBoxTitle { index } => {
            let boxes = &mut doc.student_book_content.check_it_out.boxes;
            Ok(&mut element(boxes, "check_it_out.boxes", index)?.title)
        }
        TextPath::TipBoxLine { index, line } => {
            let boxes = &mut doc.student_book_content.check_it_out.boxes;
            let tip = element(boxes, "check_it_out.boxes", index)?;
            element(&mut tip.content, "check_it_out.boxes.content", line)
        }
        TextPath::Assessment { index, field } => {
            let questions = &mut doc.teachers_guide_content.assessment.questions;
            let q = element(questions, "assessment.questions", index)?;
            Ok(match field {
                QuestionField::Question => &mut q.question,
                QuestionField::Answer => &mut q.answer,
            })
        }
        TextPath::DrillSentence { drill, index } => {
            element(&mut drill.section_mut(doc).sentences, drill.name(), index)
        }
    }
}

fn number_leaf(doc: &mut LessonDocument, path: NumberPath) -> &mut i64 {
    match path {
        NumberPath::LessonNumber => &mut doc.lesson_metadata.lesson_number,
        NumberPath::AssessmentDuration => &mut doc.teachers_guide_content.assessment.duration_minutes,
        NumberPath::DrillDuration(drill) => &mut drill.section_mut(doc).duration_minutes,
    }
}

//=========================================================================================
// Dotted paths
//=========================================================================================

/// Either kind of leaf, as parsed from a dotted JSON path such as
/// `student_book_content.new_words.3.english`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Text(TextPath),
    Number(NumberPath),
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || EditError::UnknownPath(s.to_string());
        let index = |part: &str| part.parse::<usize>().map_err(|_| unknown());
        let language = |part: &str| match part {
            "english" => Ok(Language::English),
            "portuguese" => Ok(Language::Portuguese),
            _ => Err(unknown()),
        };
        let drill = |part: &str| match part {
            "verbs_drill" => Ok(Drill::Verbs),
            "new_words_drill" => Ok(Drill::NewWords),
            "useful_phrases_drill" => Ok(Drill::UsefulPhrases),
            "grammar_drill" => Ok(Drill::Grammar),
            _ => Err(unknown()),
        };
        let bilingual = |list, i: &str, lang: &str| -> Result<FieldPath, EditError> {
            Ok(FieldPath::Text(TextPath::Bilingual {
                list,
                index: index(i)?,
                language: language(lang)?,
            }))
        };
        let list_item = |list, i: &str| -> Result<FieldPath, EditError> {
            Ok(FieldPath::Text(TextPath::ListItem { list, index: index(i)? }))
        };

        let parts: Vec<&str> = s.split('.').collect();
        match parts[..] {
            ["lesson_metadata", "lesson_title"] => Ok(FieldPath::Text(TextPath::LessonTitle)),
            ["lesson_metadata", "category"] => Ok(FieldPath::Text(TextPath::Category)),
            ["lesson_metadata", "lesson_number"] => Ok(FieldPath::Number(NumberPath::LessonNumber)),

            ["student_book_content", "verbs_header", i, lang] => bilingual(BilingualList::Verbs, i, lang),
            ["student_book_content", "new_words", i, lang] => bilingual(BilingualList::NewWords, i, lang),
            ["student_book_content", "useful_phrases", i, lang] => {
                bilingual(BilingualList::UsefulPhrases, i, lang)
            }
            ["student_book_content", "real_life", i, lang] => bilingual(BilingualList::RealLife, i, lang),
            ["student_book_content", "grammar", "examples", i, lang] => {
                bilingual(BilingualList::GrammarExamples, i, lang)
            }
            ["student_book_content", "grammar", "topics", i] => list_item(TextList::GrammarTopics, i),
            ["student_book_content", "check_it_out", "boxes", i, "title"] => {
                Ok(FieldPath::Text(TextPath::TipBoxTitle { index: index(i)? }))
            }
            ["student_book_content", "check_it_out", "boxes", i, "content", line] => {
                Ok(FieldPath::Text(TextPath::TipBoxLine {
                    index: index(i)?,
                    line: index(line)?,
                }))
            }

            ["teachers_guide_content", "header_info", "learning_objectives", i] => {
                list_item(TextList::LearningObjectives, i)
            }
            ["teachers_guide_content", "header_info", "grammar_focus", i] => {
                list_item(TextList::GrammarFocus, i)
            }
            ["teachers_guide_content", "assessment", "duration_minutes"] => {
                Ok(FieldPath::Number(NumberPath::AssessmentDuration))
            }
            ["teachers_guide_content", "assessment", "questions", i, field] => {
                let field = match field {
                    "question" => QuestionField::Question,
                    "answer" => QuestionField::Answer,
                    _ => return Err(unknown()),
                };
                Ok(FieldPath::Text(TextPath::Assessment {
                    index: index(i)?,
                    field,
                }))
            }
            ["teachers_guide_content", "drills", d, "duration_minutes"] => {
                Ok(FieldPath::Number(NumberPath::DrillDuration(drill(d)?)))
            }
            ["teachers_guide_content", "drills", d, "sentences", i] => {
                Ok(FieldPath::Text(TextPath::DrillSentence {
                    drill: drill(d)?,
                    index: index(i)?,
                }))
            }
            ["teachers_guide_content", "procedures", "homework_instructions", i] => {
                list_item(TextList::HomeworkInstructions, i)
            }
            ["teachers_guide_content", "procedures", "skills_check", "skills", i] => {
                list_item(TextList::Skills, i)
            }
            _ => Err(unknown()),
        }
    }
}

impl LessonEdit {
    /// Builds an edit from a `path=value` style assignment.
    pub fn from_assignment(path: &str, value: &str) -> Result<Self, EditError> {
        match path.parse::<FieldPath>()? {
            FieldPath::Text(path) => Ok(LessonEdit::SetText {
                path,
                value: value.to_string(),
            }),
            FieldPath::Number(number) => {
                let parsed = value.trim().parse::<i64>().map_err(|_| EditError::NotANumber {
                    path: path.to_string(),
                    value: value.to_string(),
                })?;
                Ok(LessonEdit::SetNumber {
                    path: number,
                    value: parsed,
                })
            }
        }
    }
}
