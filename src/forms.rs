use crate::models::{BetRow, Match, MatchId, Stadium, StadiumId, Team, TeamId};
use crate::workflow::split_date_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    NewTeam,
    EditTeam(TeamId),
    AssignGroup,
    NewStadium,
    EditStadium(StadiumId),
    NewMatch,
    EditMatch(MatchId),
    PlaceBet(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Choice {
        options: Vec<(u64, String)>,
        selected: Option<usize>,
    },
    Toggle(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            value: String::new(),
            kind: FieldKind::Text,
        }
    }

    pub fn secret(key: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(key, label)
        }
    }

    pub fn choice(
        key: &'static str,
        label: &'static str,
        options: Vec<(u64, String)>,
        current: Option<u64>,
    ) -> Self {
        let selected = current.and_then(|id| options.iter().position(|(opt, _)| *opt == id));
        Self {
            kind: FieldKind::Choice { options, selected },
            ..Self::text(key, label)
        }
    }

    pub fn toggle(key: &'static str, label: &'static str, on: bool) -> Self {
        Self {
            kind: FieldKind::Toggle(on),
            ..Self::text(key, label)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn display(&self) -> String {
        match &self.kind {
            FieldKind::Text => self.value.clone(),
            FieldKind::Secret => "*".repeat(self.value.chars().count()),
            FieldKind::Choice { options, selected } => selected
                .and_then(|idx| options.get(idx))
                .map(|(_, label)| format!("< {label} >"))
                .unwrap_or_else(|| "< none >".to_string()),
            FieldKind::Toggle(on) => if *on { "[x]" } else { "[ ]" }.to_string(),
        }
    }
}

/// An input form; Tab moves focus, Left/Right cycles choices, Space toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(kind: FormKind, title: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, c: char) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.kind {
            FieldKind::Text | FieldKind::Secret => field.value.push(c),
            FieldKind::Toggle(on) if c == ' ' => *on = !*on,
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus)
            && matches!(field.kind, FieldKind::Text | FieldKind::Secret)
        {
            field.value.pop();
        }
    }

    pub fn cycle(&mut self, forward: bool) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match &mut field.kind {
            FieldKind::Choice { options, selected } if !options.is_empty() => {
                let len = options.len();
                *selected = Some(match (*selected, forward) {
                    (None, true) => 0,
                    (None, false) => len - 1,
                    (Some(idx), true) => (idx + 1) % len,
                    (Some(idx), false) => (idx + len - 1) % len,
                });
            }
            FieldKind::Toggle(on) => *on = !*on,
            _ => {}
        }
    }

    fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn value(&self, key: &str) -> &str {
        self.field(key).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn choice(&self, key: &str) -> Option<u64> {
        match &self.field(key)?.kind {
            FieldKind::Choice { options, selected } => {
                selected.and_then(|idx| options.get(idx)).map(|(id, _)| *id)
            }
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.field(key).map(|f| &f.kind),
            Some(FieldKind::Toggle(true))
        )
    }
}

pub fn login_form() -> Form {
    Form::new(
        FormKind::Login,
        "Log in",
        vec![
            Field::text("email", "Email"),
            Field::secret("password", "Password"),
        ],
    )
}

pub fn register_form() -> Form {
    Form::new(
        FormKind::Register,
        "Create account",
        vec![
            Field::text("name", "Name"),
            Field::text("email", "Email"),
            Field::secret("password", "Password"),
            Field::secret("password_confirmation", "Confirm password"),
        ],
    )
}

pub fn team_form(existing: Option<&Team>) -> Form {
    let shield = Field::text("shield", "Shield image path");
    match existing {
        Some(team) => Form::new(
            FormKind::EditTeam(team.id),
            format!("Edit team: {}", team.name),
            vec![
                Field::text("name", "Name").with_value(team.name.clone()),
                shield,
            ],
        ),
        None => Form::new(
            FormKind::NewTeam,
            "New team",
            vec![Field::text("name", "Name"), shield],
        ),
    }
}

fn team_options(teams: &[Team]) -> Vec<(u64, String)> {
    teams.iter().map(|t| (t.id, t.name.clone())).collect()
}

fn stadium_options(stadiums: &[Stadium]) -> Vec<(u64, String)> {
    stadiums.iter().map(|s| (s.id, s.name.clone())).collect()
}

pub fn assign_group_form(teams: &[Team]) -> Form {
    Form::new(
        FormKind::AssignGroup,
        "Assign team to group",
        vec![
            Field::text("group", "Group (A-H)"),
            Field::choice("team", "Team", team_options(teams), None),
        ],
    )
}

pub fn stadium_form(existing: Option<&Stadium>) -> Form {
    match existing {
        Some(stadium) => Form::new(
            FormKind::EditStadium(stadium.id),
            format!("Edit stadium: {}", stadium.name),
            vec![
                Field::text("name", "Name").with_value(stadium.name.clone()),
                Field::text("characteristics", "Characteristics")
                    .with_value(stadium.characteristics.clone()),
                Field::text("remove", "Remove image ids"),
                Field::text("images", "Add image paths"),
            ],
        ),
        None => Form::new(
            FormKind::NewStadium,
            "New stadium",
            vec![
                Field::text("name", "Name"),
                Field::text("characteristics", "Characteristics"),
                Field::text("images", "Image paths"),
            ],
        ),
    }
}

pub fn new_match_form(teams: &[Team], stadiums: &[Stadium]) -> Form {
    Form::new(
        FormKind::NewMatch,
        "New match",
        vec![
            Field::choice("team1", "Team 1", team_options(teams), None),
            Field::choice("team2", "Team 2", team_options(teams), None),
            Field::choice("stadium", "Stadium", stadium_options(stadiums), None),
            Field::text("date", "Date (YYYY-MM-DD)"),
            Field::text("time", "Time (HH:MM)"),
        ],
    )
}

pub fn edit_match_form(m: &Match, title: String, stadiums: &[Stadium]) -> Form {
    let (date, time) = split_date_time(&m.date_time);
    let score = |s: Option<u32>| s.map(|v| v.to_string()).unwrap_or_default();
    Form::new(
        FormKind::EditMatch(m.id),
        title,
        vec![
            Field::text("score1", "Score team 1").with_value(score(m.score1)),
            Field::text("score2", "Score team 2").with_value(score(m.score2)),
            Field::text("date", "Date (YYYY-MM-DD)").with_value(date),
            Field::text("time", "Time (HH:MM)").with_value(time),
            Field::choice("stadium", "Stadium", stadium_options(stadiums), m.stadium_id),
            Field::toggle("processed", "Processed", m.processed),
        ],
    )
}

pub fn bet_form(row: &BetRow) -> Form {
    let score = |s: Option<u32>| s.map(|v| v.to_string()).unwrap_or_default();
    Form::new(
        FormKind::PlaceBet(row.id),
        format!(
            "Bet: {} vs {}",
            row.schedule.team1.name, row.schedule.team2.name
        ),
        vec![
            Field::text("score1", "Team 1 goals").with_value(score(row.predicted1)),
            Field::text("score2", "Team 2 goals").with_value(score(row.predicted2)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> Vec<Team> {
        vec![
            Team {
                id: 10,
                name: "Colombia".to_string(),
                shield: None,
            },
            Team {
                id: 20,
                name: "Brasil".to_string(),
                shield: None,
            },
        ]
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let mut form = login_form();
        for c in "ana@x.co".chars() {
            form.push_char(c);
        }
        form.focus_next();
        form.push_char('p');
        form.push_char('w');
        form.backspace();
        assert_eq!(form.value("email"), "ana@x.co");
        assert_eq!(form.value("password"), "p");
        assert_eq!(form.fields[1].display(), "*");
        form.focus_next();
        assert_eq!(form.focus, 0);
        form.focus_prev();
        assert_eq!(form.focus, 1);
    }

    #[test]
    fn choices_cycle_and_wrap() {
        let mut form = assign_group_form(&teams());
        form.focus_next();
        assert_eq!(form.choice("team"), None);
        form.cycle(true);
        assert_eq!(form.choice("team"), Some(10));
        form.cycle(true);
        form.cycle(true);
        assert_eq!(form.choice("team"), Some(10));
        form.cycle(false);
        assert_eq!(form.choice("team"), Some(20));
    }

    #[test]
    fn edit_match_prefills_from_match() {
        let m = Match {
            id: 4,
            team1_id: 10,
            team2_id: 20,
            stadium_id: Some(2),
            date_time: "2025-06-14 14:00:00".to_string(),
            score1: Some(1),
            score2: None,
            processed: true,
        };
        let stadiums = vec![Stadium {
            id: 2,
            name: "El Campin".to_string(),
            characteristics: String::new(),
        }];
        let mut form = edit_match_form(&m, "Colombia vs Brasil".to_string(), &stadiums);
        assert_eq!(form.value("score1"), "1");
        assert_eq!(form.value("score2"), "");
        assert_eq!(form.value("date"), "2025-06-14");
        assert_eq!(form.value("time"), "14:00");
        assert_eq!(form.choice("stadium"), Some(2));
        assert!(form.flag("processed"));

        form.focus = 5;
        form.push_char(' ');
        assert!(!form.flag("processed"));
    }
}
