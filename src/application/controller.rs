//! Event dispatch: every user action is an [`Interaction`] applied to a
//! [`SessionContext`], producing a [`Reply`].

use serde::Serialize;
use tracing::instrument;

use crate::application::services::{DocumentService, OcrService, RagService, StudyService};
use crate::application::session::{CachedDocument, SessionContext, SessionSnapshot, SourceView};
use crate::domain::{
    parse_delimited_pairs, ChatTurn, ContentHash, DocumentChunk, DomainError, OcrOutput,
    StudyPair, Subject, SummaryLength, Transcript, UploadedFile,
};

const NO_DOCUMENT_MESSAGE: &str = "Please upload and process a document first.";
const EMPTY_PDF_MESSAGE: &str =
    "Uploaded PDF has no extractable text. Use OCR section first for scanned PDFs.";
const SAFETY_MESSAGE: &str =
    "Response blocked due to safety settings. Please check your input or document content.";

#[derive(Debug, Clone)]
pub enum Interaction {
    UploadStudyFile(UploadedFile),
    RunOcr(UploadedFile),
    Chat { message: String },
    ClearChat,
    Summarize { length: SummaryLength },
    GenerateFlashcards,
    GeneratePracticeQuestions { subject: Subject, style_guide: String },
}

impl Interaction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UploadStudyFile(_) => "upload_study_file",
            Self::RunOcr(_) => "run_ocr",
            Self::Chat { .. } => "chat",
            Self::ClearChat => "clear_chat",
            Self::Summarize { .. } => "summarize",
            Self::GenerateFlashcards => "generate_flashcards",
            Self::GeneratePracticeQuestions { .. } => "generate_practice_questions",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    DocumentReady {
        file_name: String,
        content_hash: ContentHash,
        pages: usize,
        chunks: usize,
    },
    DocumentCached {
        file_name: String,
        content_hash: ContentHash,
    },
    OcrCompleted {
        file_name: String,
        preview: String,
        chars: usize,
    },
    ChatAnswered {
        answer: String,
        sources: Vec<SourceView>,
    },
    ChatCleared,
    Summary {
        length: SummaryLength,
        summary: String,
    },
    Flashcards {
        raw: String,
        cards: Vec<StudyPair>,
    },
    PracticeQuestions {
        subject: Subject,
        raw: String,
        questions: Vec<StudyPair>,
    },
    NoDocument {
        message: String,
    },
    Failed {
        action: &'static str,
        message: String,
    },
}

impl Reply {
    fn no_document() -> Self {
        Self::NoDocument {
            message: NO_DOCUMENT_MESSAGE.to_string(),
        }
    }

    fn failed(action: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            action,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Display limits applied when rendering session state.
#[derive(Debug, Clone, Copy)]
pub struct ViewLimits {
    pub excerpt_chars: usize,
    pub preview_chars: usize,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            excerpt_chars: 300,
            preview_chars: 1000,
        }
    }
}

pub struct SessionController {
    documents: DocumentService,
    rag: RagService,
    study: StudyService,
    ocr: OcrService,
    view: ViewLimits,
}

impl SessionController {
    pub fn new(
        documents: DocumentService,
        rag: RagService,
        study: StudyService,
        ocr: OcrService,
        view: ViewLimits,
    ) -> Self {
        Self {
            documents,
            rag,
            study,
            ocr,
            view,
        }
    }

    pub fn snapshot(&self, ctx: &SessionContext) -> SessionSnapshot {
        ctx.snapshot(self.view.excerpt_chars, self.view.preview_chars)
    }

    #[instrument(skip_all, fields(kind = interaction.kind()))]
    pub async fn dispatch(&self, ctx: &mut SessionContext, interaction: Interaction) -> Reply {
        let reply = match interaction {
            Interaction::UploadStudyFile(file) => self.upload(ctx, file).await,
            Interaction::RunOcr(file) => self.run_ocr(ctx, file).await,
            Interaction::Chat { message } => self.chat(ctx, message).await,
            Interaction::ClearChat => {
                if ctx.clear_chat() {
                    Reply::ChatCleared
                } else {
                    Reply::no_document()
                }
            }
            Interaction::Summarize { length } => self.summarize(ctx, length).await,
            Interaction::GenerateFlashcards => self.flashcards(ctx).await,
            Interaction::GeneratePracticeQuestions {
                subject,
                style_guide,
            } => self.practice_questions(ctx, subject, &style_guide).await,
        };

        if let Reply::Failed { message, .. } = &reply {
            tracing::warn!(%message, "interaction failed");
        }
        reply
    }

    async fn upload(&self, ctx: &mut SessionContext, file: UploadedFile) -> Reply {
        let hash = file.content_hash();
        if let Some(doc) = ctx.document_mut().filter(|doc| doc.hash == hash) {
            tracing::info!(%hash, "document unchanged, reusing index");
            doc.file_name.clone_from(&file.name);
            return Reply::DocumentCached {
                file_name: file.name,
                content_hash: hash,
            };
        }

        if let Some(previous) = ctx.evict() {
            tracing::info!(previous = %previous.hash, %hash, "new document, resetting session");
        }

        match self.process(&file, hash).await {
            Ok(document) => {
                let reply = Reply::DocumentReady {
                    file_name: document.file_name.clone(),
                    content_hash: document.hash.clone(),
                    pages: document.pages.len(),
                    chunks: document.index.chunk_count(),
                };
                ctx.activate(document);
                reply
            }
            Err(e) => {
                tracing::error!(error = %e, name = %file.name, "document processing failed");
                let message = match e {
                    DomainError::EmptyExtraction(_) => EMPTY_PDF_MESSAGE.to_string(),
                    DomainError::Validation(msg) => msg,
                    other => format!("Error processing file: {other}"),
                };
                Reply::failed("upload_study_file", message)
            }
        }
    }

    async fn process(
        &self,
        file: &UploadedFile,
        hash: ContentHash,
    ) -> Result<CachedDocument, DomainError> {
        let prepared = self.documents.prepare(file).await?;
        let index = self.rag.build_index(&prepared.chunks).await?;
        Ok(CachedDocument::new(hash, &file.name, prepared.pages, index))
    }

    async fn run_ocr(&self, ctx: &mut SessionContext, file: UploadedFile) -> Reply {
        ctx.set_ocr(None);
        if !file.is_pdf() {
            return Reply::failed("run_ocr", "OCR accepts PDF files only.");
        }

        let run = self.ocr.run(&file).await;
        match run.text {
            Some(text) => {
                let output = OcrOutput::new(text, file.stem());
                let reply = Reply::OcrCompleted {
                    file_name: output.file_name.clone(),
                    preview: output.preview(self.view.preview_chars),
                    chars: output.text.chars().count(),
                };
                ctx.set_ocr(Some(output));
                reply
            }
            None => Reply::failed(
                "run_ocr",
                run.error
                    .unwrap_or_else(|| "OCR failed or no text was extracted.".to_string()),
            ),
        }
    }

    async fn chat(&self, ctx: &mut SessionContext, message: String) -> Reply {
        let Some(doc) = ctx.document_mut() else {
            return Reply::no_document();
        };
        if message.trim().is_empty() {
            return Reply::failed("chat", "Message must not be empty.");
        }

        let history = doc.transcript.clone();
        doc.transcript.push(ChatTurn::user(message.as_str()));

        match self.answer(doc, &message, &history).await {
            Ok((answer, sources)) => {
                let views = SourceView::list(&sources, self.view.excerpt_chars);
                doc.transcript.push(ChatTurn::ai(answer.as_str(), Some(sources)));
                Reply::ChatAnswered {
                    answer,
                    sources: views,
                }
            }
            Err(e) => {
                doc.transcript
                    .push(ChatTurn::ai(format!("Sorry, an error occurred: {e}"), None));
                let message = match e {
                    DomainError::SafetyBlocked(_) => SAFETY_MESSAGE.to_string(),
                    other => format!("Error getting answer from AI: {other}"),
                };
                Reply::failed("chat", message)
            }
        }
    }

    async fn answer(
        &self,
        doc: &mut CachedDocument,
        question: &str,
        history: &Transcript,
    ) -> Result<(String, Vec<DocumentChunk>), DomainError> {
        let results = self.rag.retrieve(&doc.index, question).await?;
        doc.last_sources = results.iter().map(|r| r.chunk.clone()).collect();
        let answer = self.study.answer(question, history, &results).await?;
        Ok((answer, doc.last_sources.clone()))
    }

    async fn summarize(&self, ctx: &mut SessionContext, length: SummaryLength) -> Reply {
        let Some(doc) = ctx.document_mut() else {
            return Reply::no_document();
        };
        doc.summary = None;

        match self.study.summarize(&doc.pages, length).await {
            Ok(summary) => {
                doc.summary = Some(summary.clone());
                Reply::Summary { length, summary }
            }
            Err(e) => Reply::failed("summarize", tool_error("summary", e)),
        }
    }

    async fn flashcards(&self, ctx: &mut SessionContext) -> Reply {
        let Some(doc) = ctx.document() else {
            return Reply::no_document();
        };

        match self.study.flashcards(&doc.pages).await {
            Ok(raw) => Reply::Flashcards {
                cards: parse_delimited_pairs(&raw),
                raw,
            },
            Err(e) => Reply::failed("generate_flashcards", tool_error("flashcards", e)),
        }
    }

    async fn practice_questions(
        &self,
        ctx: &mut SessionContext,
        subject: Subject,
        style_guide: &str,
    ) -> Reply {
        let Some(doc) = ctx.document() else {
            return Reply::no_document();
        };

        match self
            .study
            .practice_questions(&doc.pages, subject, style_guide)
            .await
        {
            Ok(raw) => Reply::PracticeQuestions {
                subject,
                questions: parse_delimited_pairs(&raw),
                raw,
            },
            Err(e) => Reply::failed(
                "generate_practice_questions",
                tool_error("practice questions", e),
            ),
        }
    }
}

fn tool_error(what: &str, e: DomainError) -> String {
    match e {
        DomainError::SafetyBlocked(_) => SAFETY_MESSAGE.to_string(),
        other => format!("Error generating {what}: {other}"),
    }
}
