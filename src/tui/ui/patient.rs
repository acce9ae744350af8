//! Patient attribute entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{Feature, FeatureKind, PatientRecord};
use crate::tui::styles::MedicalTheme;

/// Form field bound to one feature
#[derive(Debug, Clone)]
pub struct FormField {
    pub feature: Feature,
    pub hint: String,
    pub value: String,
}

impl FormField {
    fn new(feature: Feature) -> Self {
        Self {
            feature,
            hint: field_hint(feature),
            value: String::new(),
        }
    }

    /// Option label for the current value of a selector field.
    fn option_label(&self) -> Option<&'static str> {
        let options = self.feature.options()?;
        let value: f64 = self.value.parse().ok()?;
        if value.fract() != 0.0 || value < 0.0 {
            return None;
        }
        options.get(value as usize).copied()
    }
}

fn unit(feature: Feature) -> &'static str {
    match feature {
        Feature::Age => "years",
        Feature::Bmi => "kg/m²",
        Feature::Crp => "mg/L",
        Feature::Hgb => "g/L",
        _ => "",
    }
}

fn field_hint(feature: Feature) -> String {
    match feature.options() {
        Some(options) => options
            .iter()
            .enumerate()
            .map(|(i, label)| format!("{i}={label}"))
            .collect::<Vec<_>>()
            .join(", "),
        None => {
            let domain = feature.domain();
            format!(
                "{} ({}-{})",
                unit(feature),
                domain.format_value(domain.min),
                domain.format_value(domain.max)
            )
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self {
            fields: Feature::ALL.iter().copied().map(FormField::new).collect(),
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' {
            self.fields[self.selected_field].value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.zeroize();
    }

    /// Step the current field by `steps` increments of its form step,
    /// staying inside the feature domain. An empty or unparsable field
    /// starts from the domain minimum.
    pub fn step(&mut self, steps: i32) {
        let field = &mut self.fields[self.selected_field];
        let domain = field.feature.domain();

        let next = match field.value.parse::<f64>() {
            Ok(current) if current.is_finite() => current + f64::from(steps) * domain.step,
            _ => domain.min,
        };
        let next = next.clamp(domain.min, domain.max);

        field.value.zeroize();
        field.value = domain.format_value(next);
        self.error_message = None;
    }

    /// Wipe all field buffers and reset the cursor.
    ///
    /// Called once a submission has been scored so entered values do not
    /// linger in UI state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse and range-check every field into a record.
    ///
    /// # Errors
    /// Returns a message naming the first offending field.
    pub fn to_record(&self) -> Result<PatientRecord, String> {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let label = field.feature.display_name();
            let value: f64 = field
                .value
                .trim()
                .parse()
                .map_err(|_| format!("{label}: Invalid number"))?;

            let domain = field.feature.domain();
            if !domain.contains(value) {
                return Err(format!(
                    "{label}: Value must be {} between {} and {}",
                    if domain.kind == FeatureKind::Continuous {
                        "a number"
                    } else {
                        "a whole number"
                    },
                    domain.format_value(domain.min),
                    domain.format_value(domain.max)
                ));
            }

            values.push((field.feature, value));
        }

        PatientRecord::from_pairs(values).map_err(|e| e.to_string())
    }

    /// Load the reference patient (form defaults)
    pub fn load_sample_data(&mut self) {
        let sample = PatientRecord::reference();
        for field in self.fields.iter_mut() {
            if let Some(v) = sample.get(field.feature) {
                field.value = field.feature.domain().format_value(v);
            }
        }
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Frailty Risk Assessment", MedicalTheme::title()),
        Span::styled(" │ Patient Attributes", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", field.feature.display_name()),
                title_style,
            ))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if field.value.is_empty() {
            spans.push(Span::styled(field.hint.as_str(), MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.as_str(), MedicalTheme::text()));
            if let Some(label) = field.option_label() {
                spans.push(Span::styled(format!("  ({label})"), MedicalTheme::text_muted()));
            }
        }
        if is_selected {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Adjust ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn select(state: &mut PatientFormState, feature: Feature) {
        state.selected_field = state
            .fields
            .iter()
            .position(|f| f.feature == feature)
            .expect("Field should exist");
    }

    #[test]
    fn test_fields_follow_display_order() {
        let state = PatientFormState::default();
        let order: Vec<Feature> = state.fields.iter().map(|f| f.feature).collect();
        assert_eq!(order, Feature::ALL.to_vec());
        assert_eq!(state.fields[4].hint, "0=high, 1=medium, 2=low");
        assert_eq!(state.fields[8].hint, "years (50-100)");
    }

    #[test]
    fn test_sample_data_produces_reference_record() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        let record = state.to_record().expect("Should parse");
        assert_eq!(record, PatientRecord::reference());
    }

    #[test]
    fn test_empty_form_is_rejected() {
        let state = PatientFormState::default();
        let err = state.to_record().unwrap_err();
        assert_eq!(err, "FTSST: Invalid number");
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        select(&mut state, Feature::Gender);
        state.clear_field();
        state.input_char('2');
        let err = state.to_record().unwrap_err();
        assert!(err.starts_with("Gender: Value must be a whole number between 0 and 1"));
    }

    #[test]
    fn test_step_stays_in_domain() {
        let mut state = PatientFormState::default();
        state.load_sample_data();

        select(&mut state, Feature::Bmi);
        state.step(1);
        assert_eq!(state.fields[state.selected_field].value, "26.1");

        select(&mut state, Feature::Pa);
        state.step(5);
        assert_eq!(state.fields[state.selected_field].value, "2");
        state.step(-9);
        assert_eq!(state.fields[state.selected_field].value, "0");

        select(&mut state, Feature::Age);
        state.clear_field();
        state.step(1);
        assert_eq!(state.fields[state.selected_field].value, "50");
    }

    #[test]
    fn test_clear_sensitive_wipes_values() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        state.selected_field = 3;
        state.clear_sensitive();
        assert!(state.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(state.selected_field, 0);
    }

    #[test]
    fn test_render_shows_option_labels() {
        let mut state = PatientFormState::default();
        state.load_sample_data();

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).expect("Should create terminal");
        terminal
            .draw(|f| render_patient_form(f, f.area(), &state))
            .expect("Should draw");

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("History of falls"));
        assert!(text.contains("(high)"));
        assert!(text.contains("150.0"));
    }
}
