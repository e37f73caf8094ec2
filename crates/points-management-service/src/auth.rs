//! 管理端认证
//!
//! 请求层用共享密钥换取 [`AdminCapability`]，核心层的管理操作只接受能力凭证，
//! 不接触原始密钥

use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// 管理能力凭证
///
/// 只能由 [`AdminAuthenticator::verify`] 构造，持有它即证明调用方出示过正确的密钥
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCapability {
    _sealed: (),
}

/// 管理密钥校验器
///
/// 只保存密钥的 SHA-256 摘要；比较摘要时不提前退出
#[derive(Clone)]
pub struct AdminAuthenticator {
    token_digest: Option<[u8; 32]>,
}

impl AdminAuthenticator {
    /// 未配置密钥（None 或空白）时，所有校验都失败
    pub fn new(token: Option<&str>) -> Self {
        let token_digest = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(digest);
        Self { token_digest }
    }

    pub fn is_configured(&self) -> bool {
        self.token_digest.is_some()
    }

    /// 校验出示的密钥，精确匹配时签发能力凭证
    pub fn verify(&self, presented: Option<&str>) -> Result<AdminCapability> {
        let (Some(expected), Some(presented)) = (self.token_digest.as_ref(), presented) else {
            return Err(LedgerError::Unauthorized);
        };

        if constant_time_eq(expected, &digest(presented)) {
            Ok(AdminCapability { _sealed: () })
        } else {
            Err(LedgerError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for AdminAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuthenticator")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
