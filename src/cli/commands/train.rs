use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::classifier::dataset::FEATURE_NAMES;
use crate::core::classifier::{TouchClassifier, TrainOptions};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{header, info, success};
use crate::utils::path::expand_tilde;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Train {
        test_size,
        seed,
        model,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;
        let opts = TrainOptions {
            test_size: test_size.unwrap_or(cfg.test_size),
            seed: seed.unwrap_or(cfg.random_seed),
            ..TrainOptions::default()
        };

        let mut classifier = TouchClassifier::new();
        let report = classifier.train(&pool, opts)?;

        header("Touch classifier");
        info(format!(
            "Samples: {} real + {} synthetic ({} train / {} test)",
            report.real_samples, report.synthetic_samples, report.train_size, report.test_size
        ));
        info(format!("Features: {}", FEATURE_NAMES.join(", ")));
        info(format!("Accuracy: {:.2}%", report.accuracy * 100.0));

        let cr = &report.classification_report;
        let mut table = Table::new(vec!["Class", "Precision", "Recall", "F1", "Support"]);
        for (name, m) in [
            ("short", &cr.short),
            ("long", &cr.long),
            ("macro avg", &cr.macro_avg),
            ("weighted avg", &cr.weighted_avg),
        ] {
            table.add_row(vec![
                name.to_string(),
                format!("{:.2}", m.precision),
                format!("{:.2}", m.recall),
                format!("{:.2}", m.f1_score),
                m.support.to_string(),
            ]);
        }
        println!();
        print!("{}", table.render());
        println!();

        let path = expand_tilde(model.as_deref().unwrap_or(&cfg.model_path));
        classifier.save(&path)?;
        success(format!("Model saved to {}", path.display()));

        ttlog_quiet(
            &pool.conn,
            "train",
            &path.to_string_lossy(),
            &format!(
                "accuracy {:.3} on {} test rows",
                report.accuracy, report.test_size
            ),
        );
    }

    Ok(())
}
