//! Access level to action-set mapping.

use kiln_core::AccessLevel;

/// The minimal actions a capability grants at each access level.
///
/// `readwrite` is derived as the sorted, de-duplicated union of `read` and
/// `write`; `admin` is deliberately unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMatrix {
    pub read: &'static [&'static str],
    pub write: &'static [&'static str],
    pub admin: &'static [&'static str],
}

impl ActionMatrix {
    pub fn actions(&self, access: AccessLevel) -> Vec<String> {
        let mut actions: Vec<String> = match access {
            AccessLevel::Read => self.read.iter().map(|a| a.to_string()).collect(),
            AccessLevel::Write => self.write.iter().map(|a| a.to_string()).collect(),
            AccessLevel::ReadWrite => self
                .read
                .iter()
                .chain(self.write.iter())
                .map(|a| a.to_string())
                .collect(),
            AccessLevel::Admin => self.admin.iter().map(|a| a.to_string()).collect(),
        };
        actions.sort();
        actions.dedup();
        actions
    }
}

pub const QUEUE_ACTIONS: ActionMatrix = ActionMatrix {
    read: &[
        "sqs:ReceiveMessage",
        "sqs:DeleteMessage",
        "sqs:GetQueueAttributes",
        "sqs:GetQueueUrl",
    ],
    write: &["sqs:SendMessage", "sqs:GetQueueAttributes", "sqs:GetQueueUrl"],
    admin: &["sqs:*"],
};

/// Write maps to the same actions as read.
pub const DATABASE_ACTIONS: ActionMatrix = ActionMatrix {
    read: &["rds-db:connect", "secretsmanager:GetSecretValue"],
    write: &["rds-db:connect", "secretsmanager:GetSecretValue"],
    admin: &["rds:*", "rds-db:*", "secretsmanager:GetSecretValue"],
};

pub const BUCKET_ACTIONS: ActionMatrix = ActionMatrix {
    read: &["s3:GetObject", "s3:ListBucket"],
    write: &["s3:PutObject", "s3:AbortMultipartUpload"],
    admin: &["s3:*"],
};

pub const TABLE_ACTIONS: ActionMatrix = ActionMatrix {
    read: &[
        "dynamodb:GetItem",
        "dynamodb:BatchGetItem",
        "dynamodb:Query",
        "dynamodb:Scan",
        "dynamodb:DescribeTable",
    ],
    write: &[
        "dynamodb:PutItem",
        "dynamodb:UpdateItem",
        "dynamodb:DeleteItem",
        "dynamodb:BatchWriteItem",
        "dynamodb:DescribeTable",
    ],
    admin: &["dynamodb:*"],
};
