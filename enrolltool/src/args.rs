//! Arguments for the enrolltool utility

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Certificate request inspection and enrollment preview utility
#[derive(Parser, Debug, Serialize, Deserialize, Default)]
#[command(arg_required_else_help(true))]
#[clap(author, version, about, long_about = None)]
pub struct EnrollToolArgs {
    /// Full path and filename of a certificate request. DER, PEM and base64 encodings are
    /// accepted.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub request_file: Option<String>,

    /// Type of the request, i.e., pkcs10, crmf or cmc. When absent the type is determined from the
    /// content of the request.
    #[clap(short = 't', long, help_heading = "COMMON OPTIONS")]
    pub request_type: Option<String>,

    /// Full path and filename of JSON-formatted enrollment profile settings. When absent, default
    /// settings are used.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub settings: Option<String>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub logging_config: Option<String>,

    /// Outputs the decoded structure of the request, including CMC controls and the outcome of
    /// proof-of-possession verification for each request.
    #[clap(short, long, help_heading = "DIAGNOSTICS")]
    pub inspect: bool,

    /// Outputs the certificate template and policy set the enrollment profile would produce for
    /// each request.
    #[clap(short, long, help_heading = "DIAGNOSTICS")]
    pub normalize: bool,

    /// Full path and filename to receive default enrollment profile settings as JSON. After the
    /// file is written, the application exits with no other parameters acted upon.
    #[clap(long, help_heading = "SETTINGS")]
    pub generate_settings: Option<String>,

    /// Verifies the identityProof and identityProofV2 controls of a CMC request using the secret
    /// associated with the identification.
    #[clap(long, help_heading = "IDENTITY PROOFING")]
    pub verify_identity: bool,

    /// Identification string used to locate the shared secret. When absent, the value of the
    /// identification control is used.
    #[clap(long, help_heading = "IDENTITY PROOFING")]
    pub identification: Option<String>,

    /// Full path and filename of a JSON object mapping identification strings to shared secrets.
    #[clap(long, help_heading = "IDENTITY PROOFING")]
    pub shared_secret_file: Option<String>,
}
