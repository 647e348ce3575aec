//! Question answering orchestration.

use crate::context::{retrieve_all, DocumentContext};
use crate::expander::expand_queries;
use crate::gateway::ModelGateway;
use crate::generator::{generate_answer, is_unknown, UNKNOWN_ANSWER};
use crate::memory::Session;
use crate::refine::{self_correct, RefineStop};
use crate::router::{label_web_answer, web_answer, FallbackRoute, FallbackRouter};
use crate::signals::SupportVerdict;
use crate::verifier::verify;
use architect_core::config::{AppConfig, PipelineConfig};
use architect_core::{AppError, AppResult};
use architect_knowledge::{PassageStore, Retriever};
use architect_llm::create_client;
use architect_prompt::PromptLibrary;
use architect_search::{create_search_client, WebSearch};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// How the final answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerRoute {
    /// Verified against the document.
    Document,
    /// The document cannot answer and no fallback applied.
    Unknown,
    /// Answered from web search results.
    Web,
}

/// Result of one [`Pipeline::ask`].
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// Text returned to the user
    pub answer: String,
    pub route: AnswerRoute,
    /// Retrieval queries derived from the question
    pub queries: Vec<String>,
    /// Locators cited in the answer, sorted
    pub sources: Vec<String>,
    pub refine_rounds: usize,
    pub refine_stop: RefineStop,
    pub verdict: SupportVerdict,
    /// Also the timestamp of the turn recorded in the session
    pub answered_at: DateTime<Utc>,
}

/// The answering pipeline.
///
/// Holds no per-conversation state: every call gets the [`Session`] to read
/// history from and append to, so one `Pipeline` can serve many sessions
/// concurrently.
pub struct Pipeline {
    model: ModelGateway,
    retriever: Arc<dyn Retriever>,
    search: Option<Arc<dyn WebSearch>>,
    router: FallbackRouter,
    settings: PipelineConfig,
}

impl Pipeline {
    /// Pipeline without web search; the router is built from
    /// `settings.external_triggers`.
    pub fn new(model: ModelGateway, retriever: Arc<dyn Retriever>, settings: PipelineConfig) -> Self {
        let router = FallbackRouter::from_triggers(&settings.external_triggers);
        Self {
            model,
            retriever,
            search: None,
            router,
            settings,
        }
    }

    /// Enable the web search fallback.
    pub fn with_web_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Replace the trigger rules.
    pub fn with_router(mut self, router: FallbackRouter) -> Self {
        self.router = router;
        self
    }

    /// Wire every gateway from configuration.
    ///
    /// Web search is enabled only when its API key is set. Validation
    /// rejects a trigger vocabulary without that key.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let api_key = config.resolve_api_key(&config.provider);
        let endpoint = config.provider_endpoint(&config.provider);
        let client = create_client(&config.provider, endpoint.as_deref(), api_key.as_deref())
            .map_err(AppError::Config)?;

        let prompts = PromptLibrary::load(&config.workspace)?;
        let model = ModelGateway::new(
            client,
            Arc::new(prompts),
            &config.model,
            config.temperature,
            config.retry_policy(),
        );

        let index_path = config.index_path();
        let store = PassageStore::open(&index_path)?;
        tracing::info!(passages = store.len(), path = ?index_path, "Opened passage index");

        let mut pipeline = Self::new(model, Arc::new(store), config.pipeline.clone());

        match config.resolve_search_api_key() {
            Some(key) => {
                let search = create_search_client(
                    &config.search.provider,
                    Some(&key),
                    &config.search.search_depth,
                    config.search.endpoint.as_deref(),
                )
                .map_err(AppError::Config)?;
                pipeline = pipeline.with_web_search(search);
            }
            None => tracing::info!(
                "No external triggers and {} unset, web search fallback disabled",
                config.search.api_key_env
            ),
        }

        Ok(pipeline)
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    pub fn has_web_search(&self) -> bool {
        self.search.is_some()
    }

    /// A fresh session sized by `history_capacity`.
    pub fn new_session(&self) -> Session {
        Session::new(self.settings.history_capacity)
    }

    /// Answer `question` within `session`.
    ///
    /// On success the (question, answer) turn is appended to the session
    /// history. On error the history is untouched.
    #[tracing::instrument(name = "ask", skip_all, fields(session = %session.id()))]
    pub async fn ask(&self, session: &mut Session, question: &str) -> AppResult<AskOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Other("Question cannot be empty".to_string()));
        }

        let queries = expand_queries(&self.model, question, self.settings.max_queries).await?;
        let passages = retrieve_all(
            self.retriever.as_ref(),
            &queries,
            self.settings.retrieval_k,
            self.model.policy(),
        )
        .await?;
        let context = DocumentContext::from_passages(passages);
        tracing::info!(
            queries = queries.len(),
            passages = context.passages.len(),
            sources = context.sources.len(),
            "Context assembled"
        );

        let draft = generate_answer(&self.model, &context, session.history(), question).await?;
        let refined = self_correct(
            &self.model,
            draft,
            &context.text,
            self.settings.max_refine_rounds,
        )
        .await?;
        let verdict = verify(&self.model, &refined.answer, &context).await?;

        let (answer, route, sources) = if verdict.is_supported() {
            if is_unknown(&refined.answer) {
                (refined.answer, AnswerRoute::Unknown, Vec::new())
            } else {
                self.cite(refined.answer, &context)
            }
        } else {
            let (answer, route) = self.fallback(question).await?;
            (answer, route, Vec::new())
        };

        tracing::info!(
            route = ?route,
            verdict = ?verdict,
            refine_rounds = refined.rounds,
            "Question answered"
        );

        let answered_at = Utc::now();
        session.record(question, &answer, answered_at);

        Ok(AskOutcome {
            answer,
            route,
            queries,
            sources,
            refine_rounds: refined.rounds,
            refine_stop: refined.stop,
            verdict,
            answered_at,
        })
    }

    fn cite(&self, answer: String, context: &DocumentContext) -> (String, AnswerRoute, Vec<String>) {
        if !self.settings.cite_sources || context.sources.is_empty() {
            return (answer, AnswerRoute::Document, Vec::new());
        }

        let sources: Vec<String> = context.sources.iter().cloned().collect();
        let cited = format!("{}\n\nSources:\n{}", answer, sources.join("\n"));
        (cited, AnswerRoute::Document, sources)
    }

    async fn fallback(&self, question: &str) -> AppResult<(String, AnswerRoute)> {
        if self.router.route(question) == FallbackRoute::Refuse {
            return Ok((UNKNOWN_ANSWER.to_string(), AnswerRoute::Unknown));
        }

        let Some(search) = self.search.as_deref() else {
            tracing::warn!("Question needs web search but none is configured");
            return Ok((UNKNOWN_ANSWER.to_string(), AnswerRoute::Unknown));
        };

        let answer = web_answer(
            &self.model,
            search,
            question,
            self.settings.web_max_results,
            self.model.policy(),
        )
        .await?;
        Ok((label_web_answer(&answer), AnswerRoute::Web))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{markers, test_gateway, ScriptedLlm, StaticRetriever, StaticSearch};
    use architect_knowledge::Passage;
    use architect_search::WebResult;

    fn pipeline(llm: Arc<ScriptedLlm>, retriever: StaticRetriever) -> Pipeline {
        Pipeline::new(
            test_gateway(llm),
            Arc::new(retriever),
            PipelineConfig::default(),
        )
    }

    fn omniverse_passages() -> StaticRetriever {
        StaticRetriever::new().with_default(vec![
            Passage::new("NVIDIA Omniverse is a platform for building 3D workflows.")
                .with_metadata("page", 14),
            Passage::new("Omniverse connects tools through OpenUSD.").with_metadata("page", 12),
        ])
    }

    fn revenue_passages() -> StaticRetriever {
        StaticRetriever::new().with_default(vec![
            Passage::new("Annual revenue was $10M.").with_metadata("page", 12),
            Passage::new("Revenue grew 20% year over year.").with_metadata("page", 14),
        ])
    }

    fn grounded_llm(answer: &str) -> ScriptedLlm {
        ScriptedLlm::new()
            .on(markers::EXPAND, "annual revenue\nrevenue growth\nsales figures")
            .on(markers::ANSWER, answer)
            .on(markers::CRITIC, "OK")
            .on(markers::VERIFY, "YES")
    }

    #[tokio::test]
    async fn test_document_answer_scenario() {
        let llm = Arc::new(grounded_llm(
            "NVIDIA Omniverse is a platform for building 3D workflows.",
        ));
        let pipeline = pipeline(llm.clone(), omniverse_passages());
        let mut session = pipeline.new_session();

        let outcome = pipeline
            .ask(&mut session, "What is NVIDIA Omniverse?")
            .await
            .unwrap();

        assert_eq!(
            outcome.answer,
            "NVIDIA Omniverse is a platform for building 3D workflows.\n\nSources:\nPage 12\nPage 14"
        );
        assert_eq!(outcome.refine_rounds, 0);
        assert_eq!(llm.count(markers::CRITIC), 1);
        assert_eq!(llm.count(markers::REFINE), 0);
        assert_eq!(session.history().len(), 1);
        assert_eq!(
            session.history().last_answered_at(),
            Some(outcome.answered_at)
        );
    }

    #[tokio::test]
    async fn test_grounded_answer_cites_sources() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let pipeline = pipeline(llm.clone(), revenue_passages());
        let mut session = pipeline.new_session();

        let outcome = pipeline
            .ask(&mut session, "What was the company's revenue?")
            .await
            .unwrap();

        assert_eq!(
            outcome.answer,
            "Revenue was $10M.\n\nSources:\nPage 12\nPage 14"
        );
        assert_eq!(outcome.route, AnswerRoute::Document);
        assert_eq!(outcome.sources, vec!["Page 12", "Page 14"]);
        assert_eq!(outcome.queries.len(), 3);
        assert_eq!(outcome.refine_stop, RefineStop::Approved);
        assert_eq!(llm.count(markers::WEB), 0);

        let turn = session.history().turns().next().unwrap();
        assert_eq!(turn.question, "What was the company's revenue?");
        assert_eq!(turn.answer, outcome.answer);
    }

    #[tokio::test]
    async fn test_each_query_retrieves_k_passages() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let retriever = Arc::new(revenue_passages());
        let pipeline = Pipeline::new(
            test_gateway(llm),
            retriever.clone(),
            PipelineConfig::default(),
        );
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Revenue?").await.unwrap();

        let calls = retriever.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, k)| *k == 2));
        let queried: Vec<String> = calls.into_iter().map(|(q, _)| q).collect();
        assert_eq!(queried, outcome.queries);
    }

    #[tokio::test]
    async fn test_unsupported_with_trigger_goes_to_web() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "nvidia ceo\nnvidia leadership\nnvidia chief executive")
                .on(markers::ANSWER, UNKNOWN_ANSWER)
                .on(markers::CRITIC, "OK")
                .on(markers::WEB, "Jensen Huang is the CEO of NVIDIA."),
        );
        let search = Arc::new(StaticSearch::new(vec![WebResult::new(
            "NVIDIA leadership",
            "Jensen Huang, founder and CEO.",
        )]));
        let pipeline =
            pipeline(llm.clone(), StaticRetriever::new()).with_web_search(search.clone());
        let mut session = pipeline.new_session();

        let outcome = pipeline
            .ask(&mut session, "Who is the current CEO of the company?")
            .await
            .unwrap();

        assert_eq!(outcome.route, AnswerRoute::Web);
        assert_eq!(outcome.verdict, SupportVerdict::Unsupported);
        assert_eq!(
            outcome.answer,
            "⚠️ Not found in the document.\n🌐 Web-based answer:\nJensen Huang is the CEO of NVIDIA."
        );
        assert!(!outcome.answer.contains("Sources:"));
        assert_eq!(
            search.queries(),
            vec![("Who is the current CEO of the company?".to_string(), 5)]
        );
        assert_eq!(session.history().len(), 1);
        // empty context: verifier is never consulted
        assert_eq!(llm.count(markers::VERIFY), 0);
    }

    #[tokio::test]
    async fn test_unsupported_without_trigger_refuses() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "warranty period")
                .on(markers::ANSWER, "The warranty is five years.")
                .on(markers::CRITIC, "OK")
                .on(markers::VERIFY, "NO"),
        );
        let search = Arc::new(StaticSearch::new(Vec::new()));
        let pipeline = pipeline(llm.clone(), revenue_passages()).with_web_search(search.clone());
        let mut session = pipeline.new_session();

        let outcome = pipeline
            .ask(&mut session, "What is the warranty period?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, UNKNOWN_ANSWER);
        assert_eq!(outcome.route, AnswerRoute::Unknown);
        assert!(search.queries().is_empty());
        assert_eq!(llm.count(markers::WEB), 0);
    }

    #[tokio::test]
    async fn test_empty_context_without_trigger_is_unknown() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "warranty")
                .on(markers::ANSWER, "Probably five years.")
                .on(markers::CRITIC, "OK"),
        );
        let pipeline = pipeline(llm, StaticRetriever::new());
        let mut session = pipeline.new_session();

        for _ in 0..2 {
            let outcome = pipeline
                .ask(&mut session, "How long is the warranty?")
                .await
                .unwrap();
            assert_eq!(outcome.answer, UNKNOWN_ANSWER);
        }
    }

    #[tokio::test]
    async fn test_trigger_without_search_client_refuses() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "ceo")
                .on(markers::ANSWER, UNKNOWN_ANSWER)
                .on(markers::CRITIC, "OK"),
        );
        let pipeline = pipeline(llm, StaticRetriever::new());
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Who is the CEO?").await.unwrap();

        assert!(!pipeline.has_web_search());
        assert_eq!(outcome.answer, UNKNOWN_ANSWER);
        assert_eq!(outcome.route, AnswerRoute::Unknown);
    }

    #[tokio::test]
    async fn test_supported_unknown_answer_not_cited() {
        let llm = Arc::new(grounded_llm("I don't know based on the document."));
        let pipeline = pipeline(llm, revenue_passages());
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Who audits the books?").await.unwrap();

        assert_eq!(outcome.answer, UNKNOWN_ANSWER);
        assert_eq!(outcome.route, AnswerRoute::Unknown);
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_no_locators_no_sources_section() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let retriever =
            StaticRetriever::new().with_default(vec![Passage::new("Annual revenue was $10M.")]);
        let pipeline = pipeline(llm, retriever);
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Revenue?").await.unwrap();

        assert_eq!(outcome.answer, "Revenue was $10M.");
        assert_eq!(outcome.route, AnswerRoute::Document);
    }

    #[tokio::test]
    async fn test_citations_can_be_disabled() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let settings = PipelineConfig {
            cite_sources: false,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(test_gateway(llm), Arc::new(revenue_passages()), settings);
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Revenue?").await.unwrap();

        assert_eq!(outcome.answer, "Revenue was $10M.");
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_history_bounded_and_rendered_into_prompt() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let settings = PipelineConfig {
            cite_sources: false,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(
            test_gateway(llm.clone()),
            Arc::new(revenue_passages()),
            settings,
        );
        let mut session = pipeline.new_session();

        for i in 1..=6 {
            pipeline
                .ask(&mut session, &format!("Question {}?", i))
                .await
                .unwrap();
        }

        assert_eq!(session.history().len(), 4);
        let first = session.history().turns().next().unwrap();
        assert_eq!(first.question, "Question 3?");

        // the sixth answer prompt saw turns 1..=5 minus the evicted first one
        let answer_prompts: Vec<String> = llm
            .prompts()
            .into_iter()
            .filter(|p| p.contains(markers::ANSWER))
            .collect();
        let last = answer_prompts.last().unwrap();
        assert!(!last.contains("User: Question 1?"));
        assert!(last.contains("User: Question 2?\nAssistant: Revenue was $10M.\n"));
        assert!(last.contains("User: Question 5?"));
    }

    #[tokio::test]
    async fn test_refine_rounds_capped() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "revenue")
                .on(markers::ANSWER, "draft")
                .on(markers::CRITIC, "Too vague.")
                .on(markers::REFINE, "better")
                .on(markers::REFINE, "best")
                .on(markers::REFINE, "even better")
                .on(markers::VERIFY, "YES"),
        );
        let pipeline = pipeline(llm.clone(), revenue_passages());
        let mut session = pipeline.new_session();

        let outcome = pipeline.ask(&mut session, "Revenue?").await.unwrap();

        assert_eq!(outcome.refine_rounds, 2);
        assert_eq!(outcome.refine_stop, RefineStop::RoundLimit);
        assert!(outcome.answer.starts_with("best"));
        assert_eq!(llm.count(markers::CRITIC), 2);
        assert_eq!(llm.count(markers::REFINE), 2);
    }

    #[tokio::test]
    async fn test_empty_expansion_falls_back_to_question() {
        let llm = Arc::new(grounded_llm("Revenue was $10M.").on(markers::EXPAND, "\n\n"));
        let retriever = Arc::new(revenue_passages());
        let pipeline = Pipeline::new(
            test_gateway(llm),
            retriever.clone(),
            PipelineConfig::default(),
        );
        let mut session = pipeline.new_session();

        // first EXPAND reply is consumed, the blank one repeats
        pipeline.ask(&mut session, "Revenue?").await.unwrap();
        let outcome = pipeline.ask(&mut session, "  Revenue?  ").await.unwrap();

        assert_eq!(outcome.queries, vec!["Revenue?"]);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let pipeline = pipeline(llm, revenue_passages());
        let mut alice = pipeline.new_session();
        let mut bob = pipeline.new_session();

        let (a, b) = tokio::join!(
            pipeline.ask(&mut alice, "Alice asks?"),
            pipeline.ask(&mut bob, "Bob asks?")
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(alice.history().len(), 1);
        assert_eq!(bob.history().len(), 1);
        assert_eq!(alice.history().turns().next().unwrap().question, "Alice asks?");
        assert_eq!(bob.history().turns().next().unwrap().question, "Bob asks?");
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates_and_history_untouched() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "revenue")
                .fail(markers::ANSWER, "model overloaded"),
        );
        let pipeline = pipeline(llm, revenue_passages());
        let mut session = pipeline.new_session();

        let result = pipeline.ask(&mut session, "Revenue?").await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let llm = Arc::new(grounded_llm("Revenue was $10M."));
        let pipeline = pipeline(llm, StaticRetriever::failing("index unavailable"));
        let mut session = pipeline.new_session();

        let result = pipeline.ask(&mut session, "Revenue?").await;
        assert!(matches!(result, Err(AppError::Retrieval(_))));
    }

    #[tokio::test]
    async fn test_web_search_failure_propagates() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .on(markers::EXPAND, "latest news")
                .on(markers::ANSWER, UNKNOWN_ANSWER)
                .on(markers::CRITIC, "OK"),
        );
        let pipeline = pipeline(llm, StaticRetriever::new())
            .with_web_search(Arc::new(StaticSearch::failing("quota exceeded")));
        let mut session = pipeline.new_session();

        let result = pipeline.ask(&mut session, "What is the latest news?").await;
        assert!(matches!(result, Err(AppError::WebSearch(_))));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let pipeline = pipeline(Arc::new(ScriptedLlm::new()), StaticRetriever::new());
        let mut session = pipeline.new_session();

        assert!(pipeline.ask(&mut session, "   ").await.is_err());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_outcome_serializes_route_lowercase() {
        let outcome = AskOutcome {
            answer: "a".to_string(),
            route: AnswerRoute::Web,
            queries: vec![],
            sources: vec![],
            refine_rounds: 0,
            refine_stop: RefineStop::Approved,
            verdict: SupportVerdict::Unsupported,
            answered_at: "2026-03-01T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["answered_at"], "2026-03-01T12:00:00Z");
        assert_eq!(json["route"], "web");
        assert_eq!(json["verdict"], "unsupported");
        assert_eq!(json["refine_stop"], "approved");
    }
}
