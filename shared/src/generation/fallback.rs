//! Canned content served when no model produced usable output.

use crate::types::{Idea, Persona, Phase, PointOfView, PrioritizationMatrix, TechSpec};

const IDEAS: &[&str] = &[
    "Interview three more users about their biggest frustration",
    "Combine two existing solutions into one simpler flow",
    "Remove the most time-consuming step entirely",
    "Offer a low-tech paper version first",
    "Let users help each other with a peer-matching board",
    "Send a timely reminder at the moment the problem occurs",
    "Create a shared checklist the whole group can edit",
    "Turn the task into a short weekly challenge",
];

pub fn ideas(count: usize) -> Vec<String> {
    IDEAS.iter().cycle().take(count).map(|s| s.to_string()).collect()
}

pub fn point_of_view() -> PointOfView {
    PointOfView {
        persona: Persona {
            name: "Alex".to_string(),
            description: "A busy student balancing classes and a part-time job".to_string(),
            goals: vec!["Save time during the week".to_string()],
            pain_points: vec!["Existing options feel slow and confusing".to_string()],
        },
        user: "A busy student".to_string(),
        need: "a faster way to get this done".to_string(),
        insight: "their free time comes in short, unpredictable gaps".to_string(),
    }
}

/// Without a model there is no effort/impact judgement, so every idea waits in fill-ins.
pub fn prioritization(ideas: &[Idea]) -> PrioritizationMatrix {
    PrioritizationMatrix {
        fill_ins: ideas.iter().map(|i| i.text.clone()).collect(),
        ..Default::default()
    }
}

pub fn tech_spec(project_name: &str) -> TechSpec {
    TechSpec {
        overview: format!("A first clickable prototype for {}.", project_name),
        features: vec![
            "Core user flow for the chosen idea".to_string(),
            "Simple feedback form".to_string(),
        ],
        stack: vec![
            "Paper or slide-based mockups".to_string(),
            "A no-code prototyping tool".to_string(),
        ],
        milestones: vec![
            "Sketch the main screens".to_string(),
            "Build the clickable prototype".to_string(),
            "Test with five users".to_string(),
        ],
    }
}

pub fn assistant(phase: Phase) -> String {
    let tip = match phase {
        Phase::Empathize => "Talk to real users and write down what they say, think, do and feel.",
        Phase::Define => "Summarize your research into one point-of-view statement: user, need, insight.",
        Phase::Ideate => "Go for quantity: list as many ideas as you can before judging any of them.",
        Phase::Prototype => "Build the cheapest thing that lets someone try your idea.",
        Phase::Test => "Watch users try your prototype and note where they hesitate.",
    };
    format!("The assistant is unavailable right now. Tip for this phase: {}", tip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_ideas_honour_count() {
        assert_eq!(ideas(3).len(), 3);
        assert_eq!(ideas(12).len(), 12);
    }
}
