use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::classifier::{PredictionInput, TouchClassifier};
use crate::errors::AppResult;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Predict {
        duration,
        session_duration,
        total_touches,
        avg_light,
        time_in_session,
        model,
    } = cmd
    {
        let path = expand_tilde(model.as_deref().unwrap_or(&cfg.model_path));
        let classifier = TouchClassifier::load(&path)?;

        let prediction = classifier.predict(&PredictionInput {
            duration: *duration,
            session_duration: *session_duration,
            total_touches: *total_touches,
            avg_light: *avg_light,
            time_in_session: *time_in_session,
        })?;

        println!("{}", serde_json::to_string_pretty(&prediction)?);
    }

    Ok(())
}
