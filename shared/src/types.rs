use serde::{Deserialize, Serialize};

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub is_admin: bool,
    pub role: Role,
    pub created_at: String,
}

/// Stored user document.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub date_of_birth: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// ========== PROJECT ==========
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Empathize,
    Define,
    Ideate,
    Prototype,
    Test,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Empathize => "empathize",
            Phase::Define => "define",
            Phase::Ideate => "ideate",
            Phase::Prototype => "prototype",
            Phase::Test => "test",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empathize" => Some(Phase::Empathize),
            "define" => Some(Phase::Define),
            "ideate" => Some(Phase::Ideate),
            "prototype" => Some(Phase::Prototype),
            "test" => Some(Phase::Test),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    #[default]
    Edit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Collaborator {
    pub username: String,
    #[serde(default)]
    pub permission: Permission,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub timestamp: String,
    pub phase: Phase,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct EmpathyMap {
    pub says: Vec<String>,
    pub thinks: Vec<String>,
    pub does: Vec<String>,
    pub feels: Vec<String>,
}

impl EmpathyMap {
    pub fn is_empty(&self) -> bool {
        self.says.is_empty() && self.thinks.is_empty() && self.does.is_empty() && self.feels.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub goals: Vec<String>,
    pub pain_points: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PointOfView {
    pub persona: Persona,
    pub user: String,
    pub need: String,
    pub insight: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Idea {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub author: Option<String>,
}

/// Effort/impact quadrants. Entries are idea texts.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PrioritizationMatrix {
    /// low effort, high impact
    pub quick_wins: Vec<String>,
    /// high effort, high impact
    pub major_projects: Vec<String>,
    /// low effort, low impact
    pub fill_ins: Vec<String>,
    /// high effort, low impact
    pub thankless_tasks: Vec<String>,
}

impl PrioritizationMatrix {
    pub fn quadrants_mut(&mut self) -> [&mut Vec<String>; 4] {
        [
            &mut self.quick_wins,
            &mut self.major_projects,
            &mut self.fill_ins,
            &mut self.thankless_tasks,
        ]
    }

    pub fn contains(&self, text: &str) -> bool {
        [&self.quick_wins, &self.major_projects, &self.fill_ins, &self.thankless_tasks]
            .iter()
            .any(|q| q.iter().any(|t| t == text))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TechSpec {
    pub overview: String,
    pub features: Vec<String>,
    pub stack: Vec<String>,
    pub milestones: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub phase: Phase,
    pub owner: String,
    #[serde(default)]
    pub shared_with: Vec<Collaborator>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    #[serde(default)]
    pub empathy_map: EmpathyMap,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub point_of_view: Option<PointOfView>,
    #[serde(default)]
    pub ideas: Vec<Idea>,
    #[serde(default)]
    pub prioritization: PrioritizationMatrix,
    pub tech_spec: Option<TechSpec>,
    pub created_at: String,
    pub updated_at: String,
}

/// A single independently-updated attribute of a project document.
#[derive(Debug, Clone)]
pub enum ProjectSection {
    Phase(Phase),
    SharedWith(Vec<Collaborator>),
    EmpathyMap(EmpathyMap),
    Constraints(Vec<String>),
    PointOfView(PointOfView),
    Ideas(Vec<Idea>),
    Prioritization(PrioritizationMatrix),
    TechSpec(TechSpec),
}

impl ProjectSection {
    pub fn attribute(&self) -> &'static str {
        match self {
            ProjectSection::Phase(_) => "phase",
            ProjectSection::SharedWith(_) => "shared_with",
            ProjectSection::EmpathyMap(_) => "empathy_map",
            ProjectSection::Constraints(_) => "constraints",
            ProjectSection::PointOfView(_) => "point_of_view",
            ProjectSection::Ideas(_) => "ideas",
            ProjectSection::Prioritization(_) => "prioritization",
            ProjectSection::TechSpec(_) => "tech_spec",
        }
    }

    /// Apply this section to an in-memory project.
    pub fn apply(self, project: &mut Project) {
        match self {
            ProjectSection::Phase(phase) => project.phase = phase,
            ProjectSection::SharedWith(list) => project.shared_with = list,
            ProjectSection::EmpathyMap(map) => project.empathy_map = map,
            ProjectSection::Constraints(list) => project.constraints = list,
            ProjectSection::PointOfView(pov) => project.point_of_view = Some(pov),
            ProjectSection::Ideas(ideas) => project.ideas = ideas,
            ProjectSection::Prioritization(matrix) => project.prioritization = matrix,
            ProjectSection::TechSpec(spec) => project.tech_spec = Some(spec),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShareProjectRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub permission: Permission,
}

#[derive(Debug, Deserialize)]
pub struct SetPhaseRequest {
    #[serde(default)]
    pub phase: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveEmpathyMapRequest {
    pub empathy_map: EmpathyMap,
}

#[derive(Debug, Deserialize)]
pub struct SaveConstraintsRequest {
    pub constraints: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SavePointOfViewRequest {
    pub point_of_view: PointOfView,
}

#[derive(Debug, Deserialize)]
pub struct SaveIdeasRequest {
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Deserialize)]
pub struct SavePrioritizationRequest {
    pub prioritization: PrioritizationMatrix,
}

#[derive(Debug, Deserialize)]
pub struct SaveTechSpecRequest {
    pub tech_spec: TechSpec,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
}

// ========== GENERATION ==========
#[derive(Debug, Deserialize, Default)]
pub struct GenerateIdeasRequest {
    pub count: Option<usize>,
    pub focus: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AssistantRequest {
    #[serde(default)]
    pub message: String,
}
