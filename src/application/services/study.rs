use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    joined_text, ports::LlmService, DocumentPage, DomainError, SearchResult, Subject,
    SummaryLength, Transcript,
};
use crate::infrastructure::config::{render_template, ContextLimits, PromptsConfig};

/// Prompt assembly and single-shot generation for the four study tools.
pub struct StudyService {
    study_llm: Arc<dyn LlmService>,
    qna_llm: Arc<dyn LlmService>,
    prompts: Arc<PromptsConfig>,
    limits: ContextLimits,
}

impl StudyService {
    pub fn new(
        study_llm: Arc<dyn LlmService>,
        qna_llm: Arc<dyn LlmService>,
        prompts: Arc<PromptsConfig>,
        limits: ContextLimits,
    ) -> Self {
        Self {
            study_llm,
            qna_llm,
            prompts,
            limits,
        }
    }

    pub fn chat_prompt(
        &self,
        question: &str,
        history: &Transcript,
        sources: &[SearchResult],
    ) -> String {
        let history_text = if history.is_empty() {
            self.prompts.chat.no_history.clone()
        } else {
            history.history_lines().join("\n")
        };
        let context = sources
            .iter()
            .map(|s| s.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        render_template(
            &self.prompts.chat.template,
            &[
                ("chat_history", history_text.as_str()),
                ("context", context.as_str()),
                ("question", question),
            ],
        )
    }

    /// Answers `question` from retrieved `sources` and prior turns in `history`.
    #[instrument(skip(self, history, sources), fields(history = history.len(), sources = sources.len()))]
    pub async fn answer(
        &self,
        question: &str,
        history: &Transcript,
        sources: &[SearchResult],
    ) -> Result<String, DomainError> {
        let prompt = self.chat_prompt(question, history, sources);
        self.qna_llm.complete(&prompt).await
    }

    pub fn summary_prompt(&self, pages: &[DocumentPage], length: SummaryLength) -> String {
        let text = joined_text(pages, self.limits.summary_chars);
        render_template(
            &self.prompts.summary.template,
            &[
                ("length_instruction", self.prompts.summary.instruction(length)),
                ("document_text", text.as_str()),
                ("length_label", length.label()),
            ],
        )
    }

    #[instrument(skip(self, pages))]
    pub async fn summarize(
        &self,
        pages: &[DocumentPage],
        length: SummaryLength,
    ) -> Result<String, DomainError> {
        let prompt = self.summary_prompt(pages, length);
        self.study_llm.complete(&prompt).await
    }

    pub fn flashcards_prompt(&self, pages: &[DocumentPage]) -> String {
        let text = joined_text(pages, self.limits.flashcard_chars);
        render_template(&self.prompts.flashcards.template, &[("document_text", text.as_str())])
    }

    #[instrument(skip(self, pages))]
    pub async fn flashcards(&self, pages: &[DocumentPage]) -> Result<String, DomainError> {
        let prompt = self.flashcards_prompt(pages);
        self.study_llm.complete(&prompt).await
    }

    pub fn practice_prompt(
        &self,
        pages: &[DocumentPage],
        subject: Subject,
        style_guide: &str,
    ) -> String {
        let text = joined_text(pages, self.limits.practice_chars);
        let examples = if style_guide.trim().is_empty() {
            self.prompts.practice_questions.no_style_guide.as_str()
        } else {
            style_guide
        };

        render_template(
            &self.prompts.practice_questions.template,
            &[
                ("subject_name", subject.display_name()),
                ("document_text", text.as_str()),
                ("example_questions_and_answers", examples),
            ],
        )
    }

    #[instrument(skip(self, pages, style_guide))]
    pub async fn practice_questions(
        &self,
        pages: &[DocumentPage],
        subject: Subject,
        style_guide: &str,
    ) -> Result<String, DomainError> {
        let prompt = self.practice_prompt(pages, subject, style_guide);
        self.study_llm.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::ScriptedLlm;
    use crate::domain::{ChatTurn, DocumentChunk, PageMetadata};

    fn service_with(study: Arc<ScriptedLlm>, qna: Arc<ScriptedLlm>, limits: ContextLimits) -> StudyService {
        StudyService::new(
            study,
            qna,
            Arc::new(PromptsConfig::bundled().unwrap()),
            limits,
        )
    }

    fn pages(texts: &[&str]) -> Vec<DocumentPage> {
        texts
            .iter()
            .map(|t| DocumentPage::new(*t, PageMetadata::default()))
            .collect()
    }

    #[tokio::test]
    async fn test_answer_uses_qna_model_and_context() {
        let study = Arc::new(ScriptedLlm::replying("unused"));
        let qna = Arc::new(ScriptedLlm::replying("Paris."));
        let service = service_with(study.clone(), qna.clone(), ContextLimits::default());
        let sources = vec![SearchResult {
            chunk: DocumentChunk::new("Paris is the capital of France.", 0),
            score: 0.9,
        }];

        let answer = service
            .answer("What is the capital of France?", &Transcript::new(), &sources)
            .await
            .unwrap();

        assert_eq!(answer, "Paris.");
        assert!(study.prompts().is_empty());
        let prompt = qna.last_prompt().unwrap();
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.contains("User's Current Question: What is the capital of France?"));
        assert!(prompt.contains("No previous chat history for this question."));
    }

    #[test]
    fn test_chat_prompt_includes_history_lines() {
        let llm = Arc::new(ScriptedLlm::replying(""));
        let service = service_with(llm.clone(), llm, ContextLimits::default());
        let mut history = Transcript::new();
        history.push(ChatTurn::user("What is osmosis?"));
        history.push(ChatTurn::ai("Water diffusion.", None));

        let prompt = service.chat_prompt("Why?", &history, &[]);

        assert!(prompt.contains("Previous user: What is osmosis?\nPrevious ai: Water diffusion."));
        assert!(!prompt.contains("No previous chat history"));
    }

    #[test]
    fn test_summary_prompt_truncates_document() {
        let llm = Arc::new(ScriptedLlm::replying(""));
        let limits = ContextLimits {
            summary_chars: 10,
            ..ContextLimits::default()
        };
        let service = service_with(llm.clone(), llm, limits);

        let prompt = service.summary_prompt(&pages(&["0123456789ABCDEF"]), SummaryLength::Short);

        assert!(prompt.contains("---\n0123456789\n---"));
        assert!(!prompt.contains("ABCDEF"));
        assert!(prompt.contains("one-paragraph executive summary"));
        assert!(prompt.contains("Short Summary (Formatted in Markdown):"));
    }

    #[test]
    fn test_flashcards_prompt_joins_pages() {
        let llm = Arc::new(ScriptedLlm::replying(""));
        let service = service_with(llm.clone(), llm, ContextLimits::default());

        let prompt = service.flashcards_prompt(&pages(&["page one", "page two"]));

        assert!(prompt.contains("page one\npage two"));
        assert!(prompt.contains("Term>>Definition"));
    }

    #[test]
    fn test_practice_prompt_style_guide_fallback() {
        let llm = Arc::new(ScriptedLlm::replying(""));
        let service = service_with(llm.clone(), llm, ContextLimits::default());
        let doc = pages(&["Newton's laws"]);

        let fallback = service.practice_prompt(&doc, Subject::Physics, "   ");
        assert!(fallback.contains("No specific style examples provided by user."));
        assert!(fallback.contains("practice questions for a Physics exam"));

        let guided = service.practice_prompt(&doc, Subject::Physics, "What is F?>>ma");
        assert!(guided.contains("What is F?>>ma"));
        assert!(!guided.contains("No specific style examples"));
    }

    #[tokio::test]
    async fn test_study_tools_use_study_model() {
        let study = Arc::new(ScriptedLlm::replying("Atom>>Unit of matter"));
        let qna = Arc::new(ScriptedLlm::replying("unused"));
        let service = service_with(study.clone(), qna.clone(), ContextLimits::default());

        let cards = service.flashcards(&pages(&["Atoms"])).await.unwrap();

        assert_eq!(cards, "Atom>>Unit of matter");
        assert_eq!(study.prompts().len(), 1);
        assert!(qna.prompts().is_empty());
    }
}
