use crate::infra::MemoryBackends;
use chrono::Local;
use clap::Args;
use nomination_portal::error::AppError;
use nomination_portal::workflows::nomination::{
    ApplicationStatus, Claim, ClaimCategory, DocumentSlot, Draft, ExportFormat, FileUpload,
    MemoryBlobStore, MemoryNotifier, MemoryRepository, NominationForm, NominationService,
    PortalSettings, StatusToken,
};
use std::path::{Path, PathBuf};

const DEMO_STORAGE_URL: &str = "http://localhost:3000/storage/v1/object/public/tops-uploads";

type DemoService = NominationService<MemoryRepository, MemoryBlobStore, MemoryNotifier>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant name used for the sample nomination
    #[arg(long, default_value = "Maria Santos")]
    pub(crate) applicant: String,
    /// Attach a real file as the nomination letter instead of a placeholder PDF
    #[arg(long)]
    pub(crate) letter: Option<PathBuf>,
    /// Review status to apply after submission (pending, under_review, approved, rejected)
    #[arg(long, default_value = "under_review", value_parser = parse_status)]
    pub(crate) status: ApplicationStatus,
}

#[derive(Args, Debug)]
pub(crate) struct TokenArgs {
    /// Number of tokens to print
    #[arg(long, default_value_t = 1)]
    pub(crate) count: usize,
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, String> {
    raw.parse::<ApplicationStatus>()
        .map_err(|err| err.to_string())
}

pub(crate) fn print_tokens(args: TokenArgs) {
    for _ in 0..args.count {
        println!("{}", StatusToken::generate());
    }
}

fn stage<T, E>(label: &'static str, result: Result<T, E>) -> Result<T, AppError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.map_err(|err| AppError::demo(label, err))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicant,
        letter,
        status,
    } = args;

    let backends = MemoryBackends::new(DEMO_STORAGE_URL);
    let service: DemoService = NominationService::new(
        backends.repository.clone(),
        backends.blobs.clone(),
        backends.notifier.clone(),
        PortalSettings::default(),
    );

    println!("TOPS nomination portal demo");
    let letter = match letter {
        Some(path) => Some(read_upload(&path)?),
        None => None,
    };

    let mut draft = fill_draft(&service, &applicant, letter)?;
    let receipt = stage("Submission", draft.submit(&service, true))?;
    drop(draft);
    println!("\nSubmitted application {}", receipt.application_id);
    println!("- Status token: {}", receipt.token);
    println!("- Status page: {}", receipt.status_url);

    let id = receipt.application_id.clone();
    service.update_status(&id, status)?;
    service.add_comment(
        &id,
        "Your documents are complete. Thank you!",
        false,
        "secretariat",
    )?;
    service.add_comment(&id, "Verify advisor signature.", true, "panel")?;

    let view = service.lookup_status(receipt.token.as_str())?;
    println!(
        "\nPublic status: {} ({} visible comment(s))",
        view.status.display_name(),
        view.comments.len()
    );
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("  Status payload unavailable: {err}"),
    }

    let message = service.send_status_email(&id, Some("See you at the panel interview."))?;
    println!("\nStatus email queued for {}: {}", message.to, message.subject);
    println!("- Outbox holds {} message(s)", backends.notifier.sent().len());

    let today = Local::now().date_naive();
    println!("\nExports");
    for format in [ExportFormat::BasicCsv, ExportFormat::ExpandedCsv, ExportFormat::DetailedJson] {
        let document = service.export(format, today)?;
        println!("- {} ({} bytes)", document.file_name, document.body.len());
    }

    let files = service.uploaded_files()?;
    println!("\nUploaded files");
    for file in &files {
        let owner = match &file.owner {
            Some(owner) => format!("{} / {}", owner.applicant, owner.field),
            None => "orphaned".to_string(),
        };
        println!("- {} [{}] {}", file.name, file.content_type, owner);
    }

    Ok(())
}

fn read_upload(path: &Path) -> Result<FileUpload, AppError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(FileUpload::new(name, content_type.essence_str(), bytes))
}

fn placeholder(slot: DocumentSlot) -> FileUpload {
    match slot {
        DocumentSlot::Photo2x2 => FileUpload::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8]),
        other => FileUpload::new(
            format!("{}.pdf", other.field_name()),
            "application/pdf",
            b"%PDF-1.7 demo".to_vec(),
        ),
    }
}

fn sample_form(applicant: &str) -> NominationForm {
    NominationForm {
        full_name: applicant.to_string(),
        complete_address: "Brgy. Poblacion, San Jose de Buenavista".to_string(),
        municipality: "San Jose de Buenavista".to_string(),
        phone_number: "09171234567".to_string(),
        email: "applicant@example.com".to_string(),
        birthday: "2008-02-14".to_string(),
        age: 17,
        sex: "Female".to_string(),
        school_level: "Senior High School".to_string(),
        school_name: "Antique National School".to_string(),
        school_address: "San Jose de Buenavista, Antique".to_string(),
        school_head_name: "Dr. Elena Ramos".to_string(),
        school_head_email: "principal@example.com".to_string(),
        school_head_mobile: "09179876543".to_string(),
        class_advisor_name: "Ms. Carla Reyes".to_string(),
        class_advisor_email: "advisor@example.com".to_string(),
        class_advisor_mobile: "09175551234".to_string(),
        ..NominationForm::default()
    }
}

fn fill_draft(
    service: &DemoService,
    applicant: &str,
    letter: Option<FileUpload>,
) -> Result<Draft<MemoryBlobStore>, AppError> {
    let mut draft = Draft::new(service.upload_tracker());
    *draft.wizard_mut().form_mut() = sample_form(applicant);

    let mut letter = letter;
    for slot in DocumentSlot::ALL {
        let upload = match slot {
            DocumentSlot::NominationLetter => letter.take().unwrap_or_else(|| placeholder(slot)),
            _ => placeholder(slot),
        };
        let url = stage(slot.label(), draft.upload_document(slot, upload))?;
        println!("- Uploaded {}: {}", slot.label(), url);
    }

    let certificate = stage(
        "Certificate upload",
        draft.upload_certificate(
            ClaimCategory::Academic,
            FileUpload::new("certificate.pdf", "application/pdf", b"%PDF-1.7 cert".to_vec()),
        ),
    )?;
    let claims = [
        (
            ClaimCategory::Academic,
            Claim {
                name: "Division Science Fair".to_string(),
                type_of_participation: "Individual Contestant".to_string(),
                rank: "1st Place".to_string(),
                level: "Division".to_string(),
                modality: None,
                file_url: Some(certificate),
            },
        ),
        (
            ClaimCategory::Leadership,
            Claim {
                name: "Supreme Secondary Learner Government".to_string(),
                type_of_participation: "President".to_string(),
                rank: "Officer".to_string(),
                level: "School".to_string(),
                modality: Some("Face-to-face".to_string()),
                file_url: None,
            },
        ),
    ];
    for (category, claim) in claims {
        stage(category.label(), draft.add_claim(category, claim))?;
    }

    println!("\nWizard");
    println!(
        "- Step {}: {}",
        draft.wizard().step().number(),
        draft.wizard().step().title()
    );
    while !draft.wizard().step().is_last() {
        let step = stage("Wizard", draft.wizard_mut().next())?;
        println!("- Step {}: {}", step.number(), step.title());
    }
    draft.wizard_mut().form_mut().data_privacy_accepted = true;

    Ok(draft)
}
