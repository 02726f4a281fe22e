use {
    anyhow::Result,
    clap::Args,
    wardline_config::WardlineConfig,
    wardline_store::{HttpResourceStore, SeedPlan, run_seed},
};

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Chat identifier for the bootstrap message.
    #[arg(long, default_value = "chat1")]
    pub chat_id: String,
    /// Logical id of the sending practitioner.
    #[arg(long, default_value = "1")]
    pub sender: String,
    /// Logical id of a recipient (repeatable; defaults to the sender).
    #[arg(long = "recipient")]
    pub recipients: Vec<String>,
    /// Message text (defaults to "Chat '<chat-id>' started.").
    #[arg(long)]
    pub message: Option<String>,
}

impl SeedArgs {
    fn to_plan(&self) -> SeedPlan {
        let recipients = if self.recipients.is_empty() {
            vec![self.sender.clone()]
        } else {
            self.recipients.clone()
        };
        SeedPlan {
            chat_id: self.chat_id.clone(),
            sender: self.sender.clone(),
            recipients,
            message: self.message.clone(),
            ..SeedPlan::default()
        }
    }
}

pub async fn handle_seed(args: &SeedArgs, config: &WardlineConfig) -> Result<()> {
    let store = HttpResourceStore::new(config.store.clone())?;
    eprintln!("Seeding FHIR store at {}", config.store.base_url);

    let report = run_seed(&store, &config.store.collection, &args.to_plan()).await?;

    println!("Practitioners (logical id -> store id):");
    for (logical_id, store_id) in &report.practitioners {
        println!("  {logical_id} -> Practitioner/{store_id}");
    }
    println!(
        "Chat '{}' bootstrap message: {}/{}",
        report.chat_id, config.store.collection, report.communication_id
    );
    Ok(())
}
