use clap::{Args, Parser, Subcommand};
use ledger_core::{
    FileState, NewPatient, NewPatientRecord, RecordStore, RecordUpdate, DEFAULT_STATE_FILE,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(about = "Patient ledger CLI")]
struct Cli {
    /// World-state snapshot file shared between invocations
    #[arg(long, global = true, env = "LEDGER_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialise the ledger
    Init,
    /// Create a patient
    CreatePatient(CreatePatientArgs),
    /// Print a patient as JSON
    QueryPatient {
        /// Patient id
        id: String,
    },
    /// Report whether anything is stored under a patient id
    PatientExists {
        /// Patient id
        id: String,
    },
    /// Create a medical record for an existing patient
    CreateRecord(CreateRecordArgs),
    /// Print a medical record as JSON
    QueryRecord {
        /// Record id
        id: String,
    },
    /// Print all records owned by a patient as a JSON array
    QueryRecordsByPatient {
        /// Patient id
        patient_id: String,
    },
    /// Replace the mutable fields of a medical record
    UpdateRecord {
        /// Record id
        id: String,
        #[command(flatten)]
        fields: RecordFieldArgs,
    },
    /// Report whether anything is stored under a record id
    RecordExists {
        /// Record id
        id: String,
    },
    /// Grant a provider emergency access to a patient
    GrantEmergencyAccess {
        /// Patient id
        patient_id: String,
        /// Provider id
        provider_id: String,
    },
    /// Revoke a provider's emergency access to a patient
    RevokeEmergencyAccess {
        /// Patient id
        patient_id: String,
        /// Provider id
        provider_id: String,
    },
}

#[derive(Args)]
struct CreatePatientArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    date_of_birth: String,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    contact_info: String,
    #[arg(long)]
    blood_group: String,
    /// Allergies (comma-separated)
    #[arg(long, default_value = "")]
    allergies: String,
    #[arg(long)]
    public_key: String,
}

#[derive(Args)]
struct CreateRecordArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    patient_id: String,
    #[arg(long)]
    doctor_id: String,
    #[arg(long)]
    record_type: String,
    #[command(flatten)]
    fields: RecordFieldArgs,
}

/// Mutable record fields, shared by create and update.
#[derive(Args)]
struct RecordFieldArgs {
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    diagnosis: String,
    #[arg(long, default_value = "")]
    treatment: String,
    /// Medications (comma-separated)
    #[arg(long, default_value = "")]
    medications: String,
    #[arg(long, default_value = "")]
    encrypted_data: String,
    /// Provider ids allowed to read the record (comma-separated)
    #[arg(long, default_value = "")]
    access_control: String,
}

impl RecordFieldArgs {
    fn into_update(self) -> RecordUpdate {
        RecordUpdate {
            description: self.description,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            medications: split_list(&self.medications),
            encrypted_data: self.encrypted_data,
            access_control: split_list(&self.access_control),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Executes one command against the snapshot, returning what should be printed.
fn run(cli: Cli) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let Some(command) = cli.command else {
        return Ok(Some("Use 'ledger --help' for commands".into()));
    };

    let state = Arc::new(FileState::open(&cli.state_file)?);
    let store = RecordStore::new(state);

    let output = match command {
        Commands::Init => {
            store.init_ledger()?;
            None
        }
        Commands::CreatePatient(args) => {
            let id = args.id.clone();
            store.create_patient(NewPatient {
                id: args.id,
                name: args.name,
                date_of_birth: args.date_of_birth,
                gender: args.gender,
                contact_info: args.contact_info,
                blood_group: args.blood_group,
                allergies: split_list(&args.allergies),
                public_key: args.public_key,
            })?;
            Some(format!("Created patient {}", id))
        }
        Commands::QueryPatient { id } => Some(to_json(&store.query_patient(&id)?)?),
        Commands::PatientExists { id } => Some(store.patient_exists(&id)?.to_string()),
        Commands::CreateRecord(args) => {
            let id = args.id.clone();
            let fields = args.fields.into_update();
            store.create_patient_record(NewPatientRecord {
                id: args.id,
                patient_id: args.patient_id,
                doctor_id: args.doctor_id,
                record_type: args.record_type,
                description: fields.description,
                diagnosis: fields.diagnosis,
                treatment: fields.treatment,
                medications: fields.medications,
                encrypted_data: fields.encrypted_data,
                access_control: fields.access_control,
            })?;
            Some(format!("Created record {}", id))
        }
        Commands::QueryRecord { id } => Some(to_json(&store.query_patient_record(&id)?)?),
        Commands::QueryRecordsByPatient { patient_id } => Some(to_json(
            &store.query_patient_records_by_patient(&patient_id)?,
        )?),
        Commands::UpdateRecord { id, fields } => {
            store.update_patient_record(&id, fields.into_update())?;
            Some(format!("Updated record {}", id))
        }
        Commands::RecordExists { id } => Some(store.patient_record_exists(&id)?.to_string()),
        Commands::GrantEmergencyAccess {
            patient_id,
            provider_id,
        } => {
            store.grant_emergency_access(&patient_id, &provider_id)?;
            Some(format!(
                "Granted emergency access to {} for patient {}",
                provider_id, patient_id
            ))
        }
        Commands::RevokeEmergencyAccess {
            patient_id,
            provider_id,
        } => {
            store.revoke_emergency_access(&patient_id, &provider_id)?;
            Some(format!(
                "Revoked emergency access from {} for patient {}",
                provider_id, patient_id
            ))
        }
    };

    Ok(output)
}

/// Splits a comma-separated argument, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_args(state_file: &std::path::Path, args: &[&str]) -> Option<String> {
        let mut argv = vec!["ledger", "--state-file", state_file.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        run(cli).expect("command should succeed")
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_state_persists_between_invocations() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state_file = temp_dir.path().join("state.json");

        run_args(
            &state_file,
            &[
                "create-patient",
                "--id",
                "P1",
                "--name",
                "Alice Smith",
                "--date-of-birth",
                "1990-01-15",
                "--gender",
                "female",
                "--contact-info",
                "alice@example.com",
                "--blood-group",
                "O+",
                "--allergies",
                "latex,penicillin",
                "--public-key",
                "pk",
            ],
        );
        run_args(&state_file, &["grant-emergency-access", "P1", "ER-7"]);

        let output = run_args(&state_file, &["query-patient", "P1"]).expect("patient JSON");
        let patient: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(patient["allergies"], serde_json::json!(["latex", "penicillin"]));
        assert_eq!(patient["emergencyAccess"], serde_json::json!(["ER-7"]));

        assert_eq!(
            run_args(&state_file, &["patient-exists", "P1"]).as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_record_commands() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state_file = temp_dir.path().join("state.json");

        let cli = Cli::try_parse_from([
            "ledger",
            "--state-file",
            state_file.to_str().unwrap(),
            "create-record",
            "--id",
            "R1",
            "--patient-id",
            "P404",
            "--doctor-id",
            "DR-1",
            "--record-type",
            "note",
        ])
        .unwrap();
        let err = run(cli).expect_err("missing patient should fail");
        assert!(err.to_string().contains("P404"));

        run_args(
            &state_file,
            &[
                "create-patient",
                "--id",
                "P1",
                "--name",
                "Bob",
                "--date-of-birth",
                "1980-02-02",
                "--gender",
                "male",
                "--contact-info",
                "bob@example.com",
                "--blood-group",
                "A-",
                "--public-key",
                "pk",
            ],
        );
        run_args(
            &state_file,
            &[
                "create-record",
                "--id",
                "R1",
                "--patient-id",
                "P1",
                "--doctor-id",
                "DR-1",
                "--record-type",
                "note",
                "--medications",
                "ibuprofen",
            ],
        );
        run_args(
            &state_file,
            &[
                "update-record",
                "R1",
                "--description",
                "follow-up",
                "--access-control",
                "DR-1,DR-2",
            ],
        );

        let output = run_args(&state_file, &["query-records-by-patient", "P1"]).unwrap();
        let records: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(records[0]["description"], "follow-up");
        assert_eq!(records[0]["accessControl"], serde_json::json!(["DR-1", "DR-2"]));
        assert_eq!(records[0]["medications"], serde_json::json!([]));
    }
}
