use crate::types::{EmpathyMap, Phase, PointOfView, Project};

pub const SYSTEM: &str = "You are a design-thinking facilitator helping a student team. \
Be concrete and brief. When asked for JSON, reply with JSON only.";

fn bullets(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(title);
    out.push_str(":\n");
    for item in items {
        out.push_str("- ");
        out.push_str(item);
        out.push('\n');
    }
}

fn project_header(project: &Project) -> String {
    let mut out = format!("PROJECT: {}\n", project.name);
    if let Some(description) = &project.description {
        out.push_str("DESCRIPTION: ");
        out.push_str(description);
        out.push('\n');
    }
    out
}

fn point_of_view(out: &mut String, pov: Option<&PointOfView>) {
    let Some(pov) = pov else {
        return;
    };
    out.push_str("POINT OF VIEW:\n");
    if !pov.persona.name.is_empty() {
        out.push_str(&format!("Persona: {} - {}\n", pov.persona.name, pov.persona.description));
    }
    out.push_str(&format!(
        "{} needs {} because {}\n",
        pov.user, pov.need, pov.insight
    ));
}

fn empathy_map(out: &mut String, map: &EmpathyMap) {
    bullets(out, "USERS SAY", &map.says);
    bullets(out, "USERS THINK", &map.thinks);
    bullets(out, "USERS DO", &map.does);
    bullets(out, "USERS FEEL", &map.feels);
}

pub fn ideas(project: &Project, count: usize, focus: Option<&str>) -> String {
    let mut out = project_header(project);
    point_of_view(&mut out, project.point_of_view.as_ref());
    bullets(&mut out, "CONSTRAINTS", &project.constraints);
    let existing: Vec<String> = project.ideas.iter().map(|i| i.text.clone()).collect();
    bullets(&mut out, "IDEAS ALREADY ON THE BOARD", &existing);
    if let Some(focus) = focus.map(str::trim).filter(|f| !f.is_empty()) {
        out.push_str(&format!("FOCUS: {}\n", focus));
    }
    out.push_str(&format!(
        "\nBrainstorm {} new, distinct solution ideas. Reply as a JSON array of short strings.",
        count
    ));
    out
}

pub fn persona(project: &Project) -> String {
    let mut out = project_header(project);
    empathy_map(&mut out, &project.empathy_map);
    out.push_str(
        "\nFrom this research, write a persona and a point-of-view statement. Reply as JSON: \
{\"persona\": {\"name\": \"\", \"description\": \"\", \"goals\": [], \"pain_points\": []}, \
\"user\": \"\", \"need\": \"\", \"insight\": \"\"}",
    );
    out
}

pub fn prioritization(project: &Project) -> String {
    let mut out = project_header(project);
    point_of_view(&mut out, project.point_of_view.as_ref());
    let ideas: Vec<String> = project.ideas.iter().map(|i| i.text.clone()).collect();
    bullets(&mut out, "IDEAS", &ideas);
    out.push_str(
        "\nSort every idea into an effort/impact matrix, using the idea text exactly. Reply as JSON: \
{\"quick_wins\": [], \"major_projects\": [], \"fill_ins\": [], \"thankless_tasks\": []} \
where quick_wins = low effort/high impact, major_projects = high effort/high impact, \
fill_ins = low effort/low impact, thankless_tasks = high effort/low impact.",
    );
    out
}

pub fn tech_spec(project: &Project) -> String {
    let mut out = project_header(project);
    point_of_view(&mut out, project.point_of_view.as_ref());
    bullets(&mut out, "CONSTRAINTS", &project.constraints);
    let chosen: Vec<String> = if project.prioritization.quick_wins.is_empty() {
        project.ideas.iter().map(|i| i.text.clone()).collect()
    } else {
        project.prioritization.quick_wins.clone()
    };
    bullets(&mut out, "CHOSEN IDEAS", &chosen);
    out.push_str(
        "\nDraft a technical specification for a first prototype. Reply as JSON: \
{\"overview\": \"\", \"features\": [], \"stack\": [], \"milestones\": []}",
    );
    out
}

fn phase_goal(phase: Phase) -> &'static str {
    match phase {
        Phase::Empathize => "understand the people they are designing for",
        Phase::Define => "frame the problem as a clear point of view",
        Phase::Ideate => "generate many possible solutions",
        Phase::Prototype => "build something quick to learn from",
        Phase::Test => "gather feedback on the prototype",
    }
}

pub fn assistant(project: &Project, message: &str) -> String {
    let mut out = project_header(project);
    out.push_str(&format!(
        "CURRENT PHASE: {} (the team is trying to {})\n",
        project.phase.as_str(),
        phase_goal(project.phase)
    ));
    let recent = project.chat.len().saturating_sub(10);
    if recent < project.chat.len() {
        out.push_str("RECENT CHAT:\n");
        for m in &project.chat[recent..] {
            out.push_str(&format!("{}: {}\n", m.sender, m.text));
        }
    }
    out.push_str(&format!("\nQUESTION: {}\nAnswer in a few sentences.", message));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Idea;

    fn project() -> Project {
        serde_json::from_value(serde_json::json!({
            "project_id": "p1",
            "name": "Dorm laundry",
            "description": "Machines are always taken",
            "phase": "ideate",
            "owner": "ana",
            "constraints": ["no app install"],
            "point_of_view": null,
            "tech_spec": null,
            "created_at": "",
            "updated_at": ""
        }))
        .unwrap()
    }

    #[test]
    fn test_ideas_prompt_carries_context() {
        let mut p = project();
        p.ideas.push(Idea {
            id: "1".into(),
            text: "sign-up sheet".into(),
            author: None,
        });
        let prompt = ideas(&p, 3, Some("  "));
        assert!(prompt.contains("Dorm laundry"));
        assert!(prompt.contains("- no app install"));
        assert!(prompt.contains("- sign-up sheet"));
        assert!(prompt.contains("Brainstorm 3"));
        assert!(!prompt.contains("FOCUS"));
    }

    #[test]
    fn test_assistant_prompt_names_phase() {
        let prompt = assistant(&project(), "What next?");
        assert!(prompt.contains("CURRENT PHASE: ideate"));
        assert!(prompt.contains("QUESTION: What next?"));
    }
}
