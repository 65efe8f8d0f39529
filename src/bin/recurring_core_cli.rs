use std::{env, sync::Arc};

use chrono::NaiveDate;
use uuid::Uuid;

use recurring_core::{
    config::ConfigManager,
    init,
    notifications::TracingChannel,
    store::{ExpenseInstanceStore, JsonFileStore, RecurringTemplateStore},
    Clock, ManualClock, PaymentStatus, RecurringTemplate, SchedulerError, SchedulerSession,
    SystemClock, TemplateId, YearMonth,
};

const USAGE: &str = "usage: recurring_core_cli [--today YYYY-MM-DD] <command>

commands:
  run                                         generate this month's instances and show totals
  reset                                       mark every payment of this month pending
  pay <instance-id>                           record a payment
  add-template <id> <name> <amount> <day> [category]
  deactivate <id>                             stop generating instances for a template
  templates                                   list templates
  list [YYYY-MM]                              list instances of a month";

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli(env::args().skip(1).collect()).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli(mut args: Vec<String>) -> Result<(), SchedulerError> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    init(config.log_filter.as_deref());

    let clock: Arc<dyn Clock> = match take_flag(&mut args, "--today")? {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                SchedulerError::InvalidInput(format!("`{}` is not a YYYY-MM-DD date", raw))
            })?;
            Arc::new(ManualClock::at_date(date))
        }
        None => Arc::new(SystemClock),
    };

    let store = Arc::new(JsonFileStore::new(
        config.resolve_data_dir(config_manager.base_dir()),
    )
    .await?);
    let session = SchedulerSession::new(
        clock.clone(),
        store.clone(),
        store.clone(),
        Arc::new(TracingChannel),
        config.reminder_policy(),
    );

    let mut args = args.into_iter();
    let command = args.next().unwrap_or_else(|| "run".to_string());
    match command.as_str() {
        "run" => {
            let outcome = session.on_mount().await?;
            let status = outcome.status;
            println!(
                "{}: paid {:.2}, pending {:.2}, total {:.2}",
                status.year_month,
                status.totals.total_paid,
                status.totals.total_pending,
                status.totals.total_expenses
            );
            if status.is_new_month {
                println!("A new month has started; run `reset` to mark payments pending.");
            }
            if !outcome.reminders.scheduled.is_empty() {
                println!("{} reminder(s) scheduled", outcome.reminders.scheduled.len());
            }
        }
        "reset" => {
            let updated = session.trigger_reset().await?;
            println!(
                "Reset {} payment(s) in {} to pending",
                updated,
                session.runner().current_year_month()
            );
        }
        "pay" => {
            let raw = required(args.next(), "instance id")?;
            let id = Uuid::parse_str(&raw)
                .map_err(|_| SchedulerError::InvalidInput(format!("`{}` is not an id", raw)))?;
            let paid = session.record_payment(id).await?;
            println!("Paid `{}` ({:.2}) for {}", paid.name, paid.amount, paid.year_month);
        }
        "add-template" => {
            let id = required(args.next(), "template id")?;
            let name = required(args.next(), "name")?;
            let amount = parse_number::<f64>(&required(args.next(), "amount")?, "amount")?;
            let day = parse_number::<u32>(&required(args.next(), "day")?, "day")?;
            let mut template = RecurringTemplate::new(id, name, amount, day)?;
            if let Some(category) = args.next() {
                template = template.with_category(category);
            }
            let id = template.id.clone();
            store.upsert(template).await?;
            println!("Saved template `{}`", id);
        }
        "deactivate" => {
            let id = TemplateId::new(required(args.next(), "template id")?);
            store.set_active(&id, false).await?;
            println!("Deactivated template `{}`", id);
        }
        "templates" => {
            for template in store.list_templates().await? {
                println!(
                    "{:<12} {:<24} {:>10.2}  day {:>2}  {}",
                    template.id,
                    template.name,
                    template.amount,
                    template.day_of_month,
                    if template.active { "active" } else { "inactive" }
                );
            }
        }
        "list" => {
            let month = match args.next() {
                Some(raw) => raw.parse::<YearMonth>()?,
                None => YearMonth::from_date(clock.today()),
            };
            for instance in store.list_for_month(month).await? {
                let status = match instance.status {
                    PaymentStatus::Paid => "paid",
                    PaymentStatus::Pending => "pending",
                };
                println!(
                    "{} {:<24} {:>10.2}  due {}  {}",
                    instance.id,
                    instance.name,
                    instance.amount,
                    instance.due_date(),
                    status
                );
            }
        }
        "help" | "--help" | "-h" => println!("{USAGE}"),
        other => {
            return Err(SchedulerError::InvalidInput(format!(
                "unknown command `{}`\n{}",
                other, USAGE
            )))
        }
    }
    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> Result<Option<String>, SchedulerError> {
    let Some(pos) = args.iter().position(|arg| arg == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(SchedulerError::InvalidInput(format!("{} needs a value", flag)));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn required(value: Option<String>, what: &str) -> Result<String, SchedulerError> {
    value.ok_or_else(|| SchedulerError::InvalidInput(format!("missing {}\n{}", what, USAGE)))
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, SchedulerError> {
    raw.parse()
        .map_err(|_| SchedulerError::InvalidInput(format!("`{}` is not a valid {}", raw, what)))
}
