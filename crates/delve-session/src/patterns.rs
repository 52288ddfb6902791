use std::time::Duration;

use delve_types::ResearchStage;

/// Content markers and heuristic keywords driving stage detection.
///
/// The markers mirror the upstream agent's own output formatting
/// (including its Korean phrasing); they are presentation conventions,
/// not a protocol, so they live in one swappable table instead of
/// being scattered as literals. The keyword heuristics run against
/// serialized payload text and knowingly accept false positives, e.g.
/// prose containing the word "research" advances the stage.
#[derive(Debug, Clone)]
pub struct StagePatterns {
    /// Graph node key carrying agent reasoning output.
    pub agent_node: String,

    /// Graph node key carrying tool execution output.
    pub tools_node: String,

    /// Agent content announcing the thinking phase.
    pub thinking_marker: String,
    pub thinking_min_display: Duration,

    /// Minimum display when the agent emits tool calls.
    pub tool_call_min_display: Duration,

    /// Tools-node content announcing a tool invocation.
    pub tool_marker: String,
    pub tool_min_display: Duration,

    /// Agent content announcing search results.
    pub result_markers: Vec<String>,
    pub result_min_display: Duration,

    /// Prefixes the agent sometimes puts in front of an echoed user
    /// question.
    pub echo_prefixes: Vec<String>,

    /// Markers showing the content is process output, not an echo.
    pub process_markers: Vec<String>,

    /// Keyword fragments matched (case-insensitively) against
    /// serialized metadata/update payloads, in priority order.
    keyword_stages: Vec<(Vec<String>, ResearchStage)>,
}

impl Default for StagePatterns {
    fn default() -> Self {
        Self {
            agent_node: "agent".to_string(),
            tools_node: "tools".to_string(),
            thinking_marker: "🤔 Thinking".to_string(),
            thinking_min_display: Duration::from_millis(2000),
            tool_call_min_display: Duration::from_millis(1500),
            tool_marker: "🔧 Tool 호출".to_string(),
            tool_min_display: Duration::from_millis(1000),
            result_markers: vec!["📊 검색 결과".to_string(), "### 📊".to_string()],
            result_min_display: Duration::from_millis(800),
            echo_prefixes: vec![
                "질문: ".to_string(),
                "Q: ".to_string(),
                "사용자 질문: ".to_string(),
            ],
            process_markers: vec![
                "🤔".to_string(),
                "🔧".to_string(),
                "📊".to_string(),
                "### ".to_string(),
                "Thinking".to_string(),
                "Tool".to_string(),
            ],
            keyword_stages: vec![
                (
                    vec!["research".to_string(), "search".to_string()],
                    ResearchStage::Researching,
                ),
                (vec!["analyz".to_string()], ResearchStage::Analyzing),
                (
                    vec!["writ".to_string(), "generat".to_string()],
                    ResearchStage::Writing,
                ),
            ],
        }
    }
}

impl StagePatterns {
    /// Map serialized payload text to a stage via substring heuristics.
    /// Matching is case-insensitive; first matching group wins.
    pub fn stage_from_text(&self, text: &str) -> Option<ResearchStage> {
        let lowered = text.to_lowercase();
        for (fragments, stage) in &self.keyword_stages {
            if fragments.iter().any(|f| lowered.contains(f.as_str())) {
                return Some(*stage);
            }
        }
        None
    }

    pub fn has_process_marker(&self, content: &str) -> bool {
        self.process_markers.iter().any(|m| content.contains(m.as_str()))
    }

    pub fn has_result_marker(&self, content: &str) -> bool {
        self.result_markers.iter().any(|m| content.contains(m.as_str()))
    }
}
