//! Line-oriented command surface of the console.

use anyhow::{Context, bail};
use edupay_session::requests::{
    ForgetPinRequest, ForgotPasswordRequest, RegisterSchoolRequest, ResendPhoneOtpRequest,
    ResetPasswordRequest, ResetPinRequest, SendAdminOtpRequest, SetPassPinRequest,
    VerifyAdminOtpRequest, VerifyEmailRequest, VerifyPhoneRequest, VerifyPortalIdRequest,
};
use edupay_session::{LoginStep, SessionController, SessionPhase, SessionResult};

pub const HELP: &str = "\
Commands:
  status [--json]                                  show the current session
  login <phone> <password>                         sign in
  select <org-id>                                  pick a school after a multi-school login
  switch <org-id>                                  change the active school
  logout                                           sign out
  register <school> <admin-name> <email> <phone> <password>
  verify-email <email> <code>
  forgot-password <phone>
  reset-password <phone> <otp> <new-password>
  admin-otp <phone>
  verify-admin-otp <phone> <otp>
  verify-portal-id <portal-id>
  verify-phone <phone> <otp>
  resend-otp <phone>
  set-pin <pin> <confirm-pin>
  forget-pin <phone>
  reset-pin <otp> <pin> <confirm-pin>
  help | quit";

pub enum Command {
    Help,
    Quit,
    Status { json: bool },
    Login { phone_number: String, password: String },
    Select { org_id: String },
    Switch { org_id: String },
    Logout,
    Register(RegisterSchoolRequest),
    VerifyEmail(VerifyEmailRequest),
    ForgotPassword(ForgotPasswordRequest),
    ResetPassword(ResetPasswordRequest),
    SendAdminOtp(SendAdminOtpRequest),
    VerifyAdminOtp(VerifyAdminOtpRequest),
    VerifyPortalId(VerifyPortalIdRequest),
    VerifyPhone(VerifyPhoneRequest),
    ResendPhoneOtp(ResendPhoneOtpRequest),
    SetPin(SetPassPinRequest),
    ForgetPin(ForgetPinRequest),
    ResetPin(ResetPinRequest),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<String> = words.map(str::to_string).collect();

    let command = match name {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "status" => Command::Status { json: args.iter().any(|a| a == "--json") },
        "login" => {
            let [phone_number, password] = take(name, args)?;
            Command::Login { phone_number, password }
        }
        "select" => {
            let [org_id] = take(name, args)?;
            Command::Select { org_id }
        }
        "switch" => {
            let [org_id] = take(name, args)?;
            Command::Switch { org_id }
        }
        "logout" => Command::Logout,
        "register" => {
            let [school_name, admin_full_name, email, phone_number, password] = take(name, args)?;
            Command::Register(RegisterSchoolRequest {
                school_name,
                admin_full_name,
                email,
                phone_number,
                password,
                school_type: None,
                organization_category: None,
            })
        }
        "verify-email" => {
            let [email, code] = take(name, args)?;
            Command::VerifyEmail(VerifyEmailRequest { email, code })
        }
        "forgot-password" => {
            let [phone_number] = take(name, args)?;
            Command::ForgotPassword(ForgotPasswordRequest { phone_number })
        }
        "reset-password" => {
            let [phone_number, otp, password] = take(name, args)?;
            Command::ResetPassword(ResetPasswordRequest { phone_number, otp, password })
        }
        "admin-otp" => {
            let [phone_number] = take(name, args)?;
            Command::SendAdminOtp(SendAdminOtpRequest { phone_number })
        }
        "verify-admin-otp" => {
            let [phone_number, otp] = take(name, args)?;
            Command::VerifyAdminOtp(VerifyAdminOtpRequest { phone_number, otp })
        }
        "verify-portal-id" => {
            let [portal_id] = take(name, args)?;
            Command::VerifyPortalId(VerifyPortalIdRequest { portal_id })
        }
        "verify-phone" => {
            let [phone_number, otp] = take(name, args)?;
            Command::VerifyPhone(VerifyPhoneRequest { phone_number, otp })
        }
        "resend-otp" => {
            let [phone_number] = take(name, args)?;
            Command::ResendPhoneOtp(ResendPhoneOtpRequest { phone_number })
        }
        "set-pin" => {
            let [pin, confirm_pin] = take(name, args)?;
            Command::SetPin(SetPassPinRequest { pin, confirm_pin })
        }
        "forget-pin" => {
            let [phone_number] = take(name, args)?;
            Command::ForgetPin(ForgetPinRequest { phone_number })
        }
        "reset-pin" => {
            let [otp, pin, confirm_pin] = take(name, args)?;
            Command::ResetPin(ResetPinRequest { otp, pin, confirm_pin })
        }
        other => bail!("unknown command '{other}' (try 'help')"),
    };

    Ok(Some(command))
}

fn take<const N: usize>(name: &str, args: Vec<String>) -> anyhow::Result<[String; N]> {
    let given = args.len();
    <[String; N]>::try_from(args)
        .ok()
        .with_context(|| format!("'{name}' takes {N} argument(s), got {given}"))
}

/// Run one command. Returns `false` when the console should exit.
///
/// Session failures have already been reported through the notifier, so they
/// are not propagated.
pub async fn execute(controller: &SessionController, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
        Command::Status { json } => print_status(controller, json)?,
        Command::Login { phone_number, password } => {
            if let Ok(LoginStep::SelectSchool(orgs)) =
                controller.login(&phone_number, &password).await
            {
                println!("Choose a school with 'select <org-id>':");
                for org in orgs {
                    println!("  {}  {}", org.id, org.organization_name);
                }
            }
        }
        Command::Select { org_id } => report(controller.select_school(&org_id).await),
        Command::Switch { org_id } => report(controller.switch_organization(&org_id).await),
        Command::Logout => controller.logout().await,
        Command::Register(request) => report(controller.register_school(&request).await),
        Command::VerifyEmail(request) => report(controller.verify_email(&request).await),
        Command::ForgotPassword(request) => report(controller.forgot_password(&request).await),
        Command::ResetPassword(request) => report(controller.reset_password(&request).await),
        Command::SendAdminOtp(request) => report(controller.send_admin_otp(&request).await),
        Command::VerifyAdminOtp(request) => report(controller.verify_admin_otp(&request).await),
        Command::VerifyPortalId(request) => report(controller.verify_portal_id(&request).await),
        Command::VerifyPhone(request) => report(controller.verify_phone(&request).await),
        Command::ResendPhoneOtp(request) => report(controller.resend_phone_otp(&request).await),
        Command::SetPin(request) => report(controller.set_pass_pin(&request).await),
        Command::ForgetPin(request) => report(controller.forget_pin(&request).await),
        Command::ResetPin(request) => report(controller.reset_pin(&request).await),
    }

    Ok(true)
}

fn report<T>(result: SessionResult<T>) {
    if let Err(e) = result {
        tracing::debug!(code = %e.code(), "Command failed");
    }
}

fn print_status(controller: &SessionController, json: bool) -> anyhow::Result<()> {
    let state = controller.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    match state.phase() {
        SessionPhase::Booting => println!("Starting up"),
        SessionPhase::Unauthenticated => println!("Signed out"),
        SessionPhase::AwaitingOrgSelection { schools, .. } => {
            println!("Waiting for school selection:");
            for org in schools {
                println!("  {}  {}", org.id, org.organization_name);
            }
        }
        SessionPhase::Authenticated { user, schools, selected_school } => {
            println!("Signed in as {} ({})", user.full_name, user.role);
            for org in schools {
                let marker = if Some(org) == selected_school { "*" } else { " " };
                println!("{marker} {}  {}", org.id, org.organization_name);
            }
        }
    }

    if let Some(error) = &state.error {
        println!("Last error: {error}");
    }
    Ok(())
}
