//! Property-based tests for job naming and hyperparameter persistence.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde_json::Value;
use tempfile::TempDir;
use trialkit_core::jobfile::MAX_JOB_NAME_LEN;
use trialkit_core::{truncate_job_name, ArtifactStore, Hparams, JobSpec, JobWriter};

// --- Job name truncation ---

proptest! {
    #[test]
    fn truncated_name_is_a_bounded_prefix(name in "\\PC{0,40}") {
        let short = truncate_job_name(&name);
        prop_assert!(name.starts_with(short));
        prop_assert!(short.chars().count() <= MAX_JOB_NAME_LEN);
        if name.chars().count() <= MAX_JOB_NAME_LEN {
            prop_assert_eq!(short, name.as_str());
        }
    }

    #[test]
    fn script_labels_use_truncated_name(name in "[a-z_]{1,40}") {
        let writer = JobWriter::new().unwrap();
        let spec = JobSpec::new("true", name.clone(), "sbatch", "/scratch/");
        let script = writer.render(&spec).unwrap();
        let short = truncate_job_name(&name);

        let job_name_directive = format!("#SBATCH --job-name={short}\n");
        prop_assert!(script.contains(&job_name_directive));
        let jobfile_suffix = format!("{name}.s");
        prop_assert!(spec.jobfile_path().ends_with(&jobfile_suffix));
    }
}

// --- Hyperparameter round-trip ---

proptest! {
    #[test]
    fn hparams_roundtrip_preserves_fields(
        seed in -1000i64..(u32::MAX as i64),
        n_rnn in 1u64..1024,
        activation in "[a-z]{1,12}",
        eighths in -8000i32..8000,
    ) {
        let dir = TempDir::new().unwrap();
        let mut hp = Hparams::new();
        hp.insert("seed", seed);
        hp.insert("n_rnn", n_rnn);
        hp.insert("activation", activation);
        hp.insert("learning_rate", f64::from(eighths) / 8.0);
        hp.insert("rng", Value::Null);

        ArtifactStore::save_hparams(&hp, dir.path()).unwrap();
        let mut loaded = ArtifactStore::load_hparams(dir.path()).unwrap().unwrap();

        let mut expected = StdRng::seed_from_u64((seed + 1000) as u64);
        prop_assert_eq!(loaded.rng.next_u64(), expected.next_u64());
        prop_assert_eq!(loaded.rng.next_u64(), expected.next_u64());
        prop_assert_eq!(loaded.hparams, hp.persistable());
        prop_assert!(hp.contains_key("rng"));
    }
}
