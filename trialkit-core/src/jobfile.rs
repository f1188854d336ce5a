//! SLURM batch-script generation.
//!
//! A [`JobSpec`] is rendered into `<sbatch_dir>/<job_name>.s` through one of
//! two Handlebars templates: a CPU script, or a GPU script that adds a
//! partition selector and a `--gres` request for one GPU. Any non-zero GPU
//! count selects the GPU script; the request itself is always `gpu:1`.
//! Resource values are rendered as given; a negative node count reaches the
//! scheduler unchanged.
//!
//! The generated script always ends in `exit 0;`, so the scheduler records
//! success even when the wrapped command fails.

use crate::error::TrialkitError;
use crate::persistence::ensure_dir;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest job name the scheduler shows in its queue listing.
pub const MAX_JOB_NAME_LEN: usize = 16;

/// Partition requested by GPU jobs.
pub const GPU_PARTITION: &str = "gpu";

/// Generic resource line of GPU scripts, independent of the GPU count.
pub const GPU_GRES: &str = "gpu:1";

/// Extension of generated batch scripts.
pub const JOBFILE_EXTENSION: &str = "s";

const CPU_TEMPLATE_NAME: &str = "cpu";
const GPU_TEMPLATE_NAME: &str = "gpu";

const CPU_TEMPLATE: &str = "#! /bin/bash

#SBATCH --nodes={{nodes}}
#SBATCH --ntasks-per-node=1
#SBATCH --cpus-per-task={{ppn}}
#SBATCH --mem={{mem_gb}}GB
#SBATCH --time={{hours}}:00:00
#SBATCH --job-name={{short_name}}
#SBATCH --output={{output_path}}

cd {{scratch_dir}}
pwd > {{log_file}}
date >> {{log_file}}
which python >> {{log_file}}
{{command}} >> {{log_file}} 2>&1

exit 0;
";

const GPU_TEMPLATE: &str = "#! /bin/bash

#SBATCH --nodes={{nodes}}
#SBATCH --ntasks-per-node=1
#SBATCH --cpus-per-task={{ppn}}
#SBATCH --mem={{mem_gb}}GB
#SBATCH --partition={{partition}}
#SBATCH --gres={{gres}}
#SBATCH --time={{hours}}:00:00
#SBATCH --job-name={{short_name}}
#SBATCH --output={{output_path}}

cd {{scratch_dir}}
pwd > {{log_file}}
date >> {{log_file}}
which python >> {{log_file}}
{{command}} >> {{log_file}} 2>&1

exit 0;
";

/// Resources requested from the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub nodes: i64,
    /// Cores per node, rendered as `--cpus-per-task`.
    pub ppn: i64,
    pub gpus: i64,
    pub mem_gb: i64,
    /// Wall-clock limit in whole hours.
    pub hours: i64,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            nodes: 1,
            ppn: 1,
            gpus: 0,
            mem_gb: 16,
            hours: 12,
        }
    }
}

impl Resources {
    pub fn uses_gpu(&self) -> bool {
        self.gpus != 0
    }
}

/// Everything needed to render one batch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Shell command run by the job, inserted verbatim.
    pub command: String,
    pub job_name: String,
    /// Directory receiving the generated script.
    pub sbatch_dir: PathBuf,
    /// Working directory of the job; scheduler output goes to its `log/`.
    pub scratch_dir: PathBuf,
    pub resources: Resources,
}

impl JobSpec {
    pub fn new(
        command: impl Into<String>,
        job_name: impl Into<String>,
        sbatch_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            job_name: job_name.into(),
            sbatch_dir: sbatch_dir.into(),
            scratch_dir: scratch_dir.into(),
            resources: Resources::default(),
        }
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Where the script for this job is written. Uses the full job name.
    pub fn jobfile_path(&self) -> PathBuf {
        self.sbatch_dir
            .join(format!("{}.{JOBFILE_EXTENSION}", self.job_name))
    }
}

/// Cut `name` to the scheduler's label limit, counting characters.
pub fn truncate_job_name(name: &str) -> &str {
    match name.char_indices().nth(MAX_JOB_NAME_LEN) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    nodes: i64,
    ppn: i64,
    mem_gb: i64,
    hours: i64,
    partition: &'a str,
    gres: &'a str,
    short_name: &'a str,
    output_path: String,
    scratch_dir: String,
    log_file: String,
    command: &'a str,
}

/// Renders and writes batch scripts. Templates are registered once.
pub struct JobWriter {
    registry: Handlebars<'static>,
}

impl JobWriter {
    pub fn new() -> Result<Self, TrialkitError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(CPU_TEMPLATE_NAME, CPU_TEMPLATE)
            .map_err(|e| TrialkitError::template(e.to_string()))?;
        registry
            .register_template_string(GPU_TEMPLATE_NAME, GPU_TEMPLATE)
            .map_err(|e| TrialkitError::template(e.to_string()))?;
        Ok(Self { registry })
    }

    /// Render the script text for `spec` without touching the filesystem.
    pub fn render(&self, spec: &JobSpec) -> Result<String, TrialkitError> {
        let short_name = truncate_job_name(&spec.job_name);
        let res = &spec.resources;
        let context = TemplateContext {
            nodes: res.nodes,
            ppn: res.ppn,
            mem_gb: res.mem_gb,
            hours: res.hours,
            partition: GPU_PARTITION,
            gres: GPU_GRES,
            short_name,
            output_path: spec
                .scratch_dir
                .join("log")
                .join(format!("{short_name}.o"))
                .display()
                .to_string(),
            scratch_dir: spec.scratch_dir.display().to_string(),
            log_file: Path::new("log")
                .join(format!("{short_name}.log"))
                .display()
                .to_string(),
            command: &spec.command,
        };
        let template = if res.uses_gpu() {
            GPU_TEMPLATE_NAME
        } else {
            CPU_TEMPLATE_NAME
        };
        self.registry
            .render(template, &context)
            .map_err(|e| TrialkitError::template(e.to_string()))
    }

    /// Write the script for `spec` and return its path.
    pub fn write(&self, spec: &JobSpec) -> Result<PathBuf, TrialkitError> {
        ensure_dir(&spec.sbatch_dir)?;
        let script = self.render(spec)?;
        let path = spec.jobfile_path();
        std::fs::write(&path, script)?;
        tracing::info!(
            path = %path.display(),
            job = %spec.job_name,
            gpus = spec.resources.gpus,
            "wrote job file"
        );
        Ok(path)
    }
}

/// Render and write the batch script for `spec`, returning its path.
pub fn write_jobfile(spec: &JobSpec) -> Result<PathBuf, TrialkitError> {
    JobWriter::new()?.write(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn spec(dir: &Path, name: &str, gpus: i64) -> JobSpec {
        JobSpec::new("echo hi", name, dir.join("sbatch"), "/scratch/run/").with_resources(
            Resources {
                nodes: 1,
                ppn: 2,
                gpus,
                mem_gb: 8,
                hours: 1,
            },
        )
    }

    #[test]
    fn test_default_resources() {
        let res = Resources::default();
        assert_eq!(
            (res.nodes, res.ppn, res.gpus, res.mem_gb, res.hours),
            (1, 1, 0, 16, 12)
        );
        assert!(!res.uses_gpu());
    }

    #[test]
    fn test_truncate_job_name() {
        assert_eq!(truncate_job_name("short"), "short");
        assert_eq!(truncate_job_name("exactly_16_chars"), "exactly_16_chars");
        assert_eq!(
            truncate_job_name("a_rather_long_job_name"),
            "a_rather_long_jo"
        );
        assert_eq!(truncate_job_name("ééééééééééééééééé"), "éééééééééééééééé");
    }

    #[test]
    fn test_render_cpu_script() {
        let dir = TempDir::new().unwrap();
        let writer = JobWriter::new().unwrap();
        let script = writer.render(&spec(dir.path(), "test_job", 0)).unwrap();

        let expected = "#! /bin/bash

#SBATCH --nodes=1
#SBATCH --ntasks-per-node=1
#SBATCH --cpus-per-task=2
#SBATCH --mem=8GB
#SBATCH --time=1:00:00
#SBATCH --job-name=test_job
#SBATCH --output=/scratch/run/log/test_job.o

cd /scratch/run/
pwd > log/test_job.log
date >> log/test_job.log
which python >> log/test_job.log
echo hi >> log/test_job.log 2>&1

exit 0;
";
        assert_eq!(script, expected);
    }

    #[test]
    fn test_render_gpu_script() {
        let dir = TempDir::new().unwrap();
        let writer = JobWriter::new().unwrap();
        let script = writer.render(&spec(dir.path(), "test_job", 1)).unwrap();

        assert!(script.contains("#SBATCH --partition=gpu\n"));
        assert!(script.contains("#SBATCH --gres=gpu:1\n"));
        assert!(script.ends_with("exit 0;\n"));
    }

    #[test]
    fn test_multi_gpu_job_requests_single_gres() {
        let dir = TempDir::new().unwrap();
        let writer = JobWriter::new().unwrap();
        for gpus in [2, 4, -1] {
            let script = writer.render(&spec(dir.path(), "multi_gpu", gpus)).unwrap();
            assert!(script.contains("#SBATCH --partition=gpu\n"));
            assert!(script.contains("#SBATCH --gres=gpu:1\n"));
            assert_eq!(script.matches("--gres").count(), 1);
        }
    }

    #[test]
    fn test_command_is_not_escaped() {
        let dir = TempDir::new().unwrap();
        let mut job = spec(dir.path(), "quoting", 0);
        job.command = "python train.py --rule 'a&b' > /dev/null".to_string();

        let script = JobWriter::new().unwrap().render(&job).unwrap();
        assert!(script.contains("python train.py --rule 'a&b' > /dev/null >> log/quoting.log 2>&1"));
    }

    #[test]
    fn test_negative_resources_render_verbatim() {
        let dir = TempDir::new().unwrap();
        let job = spec(dir.path(), "neg", 0).with_resources(Resources {
            nodes: -1,
            ppn: 0,
            gpus: 0,
            mem_gb: -4,
            hours: 0,
        });
        let script = JobWriter::new().unwrap().render(&job).unwrap();
        assert!(script.contains("--nodes=-1\n"));
        assert!(script.contains("--cpus-per-task=0\n"));
        assert!(script.contains("--mem=-4GB\n"));
        assert!(script.contains("--time=0:00:00\n"));
    }

    #[test]
    fn test_write_uses_full_name_for_path() {
        let dir = TempDir::new().unwrap();
        let job = spec(dir.path(), "a_rather_long_job_name", 0);

        let path = write_jobfile(&job).unwrap();

        assert_eq!(path, dir.path().join("sbatch").join("a_rather_long_job_name.s"));
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.contains("--job-name=a_rather_long_jo\n"));
        assert!(script.contains("--output=/scratch/run/log/a_rather_long_jo.o\n"));
        assert!(!script.contains("a_rather_long_job_name"));
    }
}
