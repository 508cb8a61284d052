//! `template-ctl`: manage templates and files on the backend, export captured
//! data, and check saved template files offline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use template_api::{ApiClient, ApiConfig, NewFile, NewTemplate, PageUpload};
use template_core::template::{DataUri, TemplateFile};
use template_core::Section;

#[derive(Parser)]
#[command(name = "template-ctl")]
#[command(about = "Manage extraction templates, files and XML exports")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides TEMPLATE_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token (overrides TEMPLATE_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List templates
    Templates,

    /// Create a template
    CreateTemplate {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List the forms of a template
    Forms { template_id: i64 },

    /// Upload a page image as a new form of a template
    UploadForm {
        template_id: i64,
        /// Form name
        #[arg(short, long)]
        name: String,
        image: PathBuf,
    },

    /// List files
    Files,

    /// Create a file bound to a template
    CreateFile {
        name: String,
        #[arg(short, long)]
        template_id: i64,
        #[arg(short, long, default_value = "1")]
        user_id: i64,
    },

    /// List the documents uploaded to a file
    Documents { file_id: i64 },

    /// Upload already-rasterised PNG pages as a file's document for a form
    UploadPages {
        file_id: i64,
        form_id: i64,
        /// Page images in page order
        #[arg(required = true)]
        pages: Vec<PathBuf>,
    },

    /// Export a file's captured data as XML
    Export {
        file_id: i64,
        #[arg(short, long, default_value = "response.xml")]
        output: PathBuf,
    },

    /// Validate a saved template JSON and summarise it
    Inspect { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ApiConfig::from_env();
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(token) = cli.token {
        config.token = Some(token);
    }
    let api = ApiClient::new(config);

    match cli.command {
        Commands::Templates => cmd_templates(&api).await?,
        Commands::CreateTemplate { name, description } => cmd_create_template(&api, name, description).await?,
        Commands::Forms { template_id } => cmd_forms(&api, template_id).await?,
        Commands::UploadForm { template_id, name, image } => cmd_upload_form(&api, template_id, &name, &image).await?,
        Commands::Files => cmd_files(&api).await?,
        Commands::CreateFile { name, template_id, user_id } => {
            cmd_create_file(&api, NewFile { name, template_id, user_id }).await?
        }
        Commands::Documents { file_id } => cmd_documents(&api, file_id).await?,
        Commands::UploadPages { file_id, form_id, pages } => cmd_upload_pages(&api, file_id, form_id, &pages).await?,
        Commands::Export { file_id, output } => cmd_export(&api, file_id, &output).await?,
        Commands::Inspect { path } => cmd_inspect(&path)?,
    }

    Ok(())
}

async fn cmd_templates(api: &ApiClient) -> Result<()> {
    let templates = api.list_templates().await.context("listing templates")?;
    for t in &templates {
        println!("{:>5}  {}", t.id, t.name);
    }
    log::info!("{} templates", templates.len());
    Ok(())
}

async fn cmd_create_template(api: &ApiClient, name: String, description: Option<String>) -> Result<()> {
    if name.trim().is_empty() {
        bail!("template name must not be empty");
    }
    let created = api
        .create_template(&NewTemplate { name, description })
        .await
        .context("creating template")?;
    println!("created template {} ({})", created.id, created.name);
    Ok(())
}

async fn cmd_forms(api: &ApiClient, template_id: i64) -> Result<()> {
    let forms = api.list_forms(template_id).await.context("listing forms")?;
    for form in &forms {
        let pages = form.template.as_ref().map_or(0, |t| t.data.len());
        let params: usize = form
            .all_page_params
            .as_ref()
            .map_or(0, |m| m.values().map(Vec::len).sum());
        println!("{:>5}  {:<30} {pages} pages, {params} parameters", form.id, form.name);
    }
    Ok(())
}

async fn cmd_upload_form(api: &ApiClient, template_id: i64, name: &str, image: &Path) -> Result<()> {
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let mime = match image.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => bail!("{} is not a PNG or JPEG image", image.display()),
    };
    let created = api
        .upload_form(template_id, name, bytes, mime)
        .await
        .context("uploading form")?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

async fn cmd_files(api: &ApiClient) -> Result<()> {
    let files = api.list_files().await.context("listing files")?;
    for f in &files {
        let template = f.template_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("{:>5}  {:<30} template {template}", f.id, f.name);
    }
    Ok(())
}

async fn cmd_create_file(api: &ApiClient, new: NewFile) -> Result<()> {
    if new.name.trim().is_empty() {
        bail!("file name must not be empty");
    }
    let created = api.create_file(&new).await.context("creating file")?;
    println!("created file {} ({})", created.id, created.name);
    Ok(())
}

async fn cmd_documents(api: &ApiClient, file_id: i64) -> Result<()> {
    let docs = api.list_documents(file_id).await.context("listing documents")?;
    for d in &docs {
        println!("{:>5}  form {:<5} {}", d.id, d.form_id, d.image_path.as_deref().unwrap_or("-"));
    }
    Ok(())
}

async fn cmd_upload_pages(api: &ApiClient, file_id: i64, form_id: i64, pages: &[PathBuf]) -> Result<()> {
    let mut uploads = Vec::with_capacity(pages.len());
    for (i, path) in pages.iter().enumerate() {
        let png = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        uploads.push(PageUpload { page: i as u32 + 1, png });
    }
    api.upload_document_pages(file_id, form_id, uploads)
        .await
        .context("uploading document pages")?;
    println!("uploaded {} pages to file {file_id}, form {form_id}", pages.len());
    Ok(())
}

async fn cmd_export(api: &ApiClient, file_id: i64, output: &Path) -> Result<()> {
    let xml = api.export_file(file_id).await.context("exporting file")?;
    std::fs::write(output, &xml).with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {} ({} bytes)", output.display(), xml.len());
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file = TemplateFile::from_json(&text).with_context(|| format!("parsing {}", path.display()))?;
    let mut n = 0;
    let mut section = Section::new(1, "inspect");
    file.apply_to(&mut section, || {
        n += 1;
        format!("Param unnamed-{n}")
    })
    .context("loading template")?;

    println!("description: {}", file.description);
    match &section.document {
        Some(doc) => println!("document: {} ({} pages)", doc.filename, doc.total_pages),
        None => println!("single image"),
    }
    for (page, uri) in &section.page_images {
        let bytes = DataUri::parse(uri)?.decode().map(|b| b.len()).unwrap_or(0);
        let (w, h) = section.page_sizes.get(page).copied().unwrap_or_default();
        println!("  page {page}: {w}x{h}, {bytes} bytes");
    }
    let print = |label: String, params: &[template_core::Parameter]| {
        println!("{label}: {} parameters", params.len());
        for p in params {
            println!(
                "    {:<24} {:<8} ({}, {}) - ({}, {}){}",
                p.id,
                p.param_type.as_str(),
                p.x1,
                p.y1,
                p.x2,
                p.y2,
                if p.is_multiline { " multiline" } else { "" }
            );
        }
    };
    if section.has_document() {
        for (page, params) in section.params_by_page() {
            print(format!("  page {page}"), params);
        }
    } else {
        print("  image".to_string(), &section.params);
    }
    if n > 0 {
        log::warn!("{n} parameters had no id");
    }
    Ok(())
}
