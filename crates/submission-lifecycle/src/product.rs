//! 商品目录与下单校验
//!
//! 商品类型、单价表、数量范围校验以及订单金额容差检查。
//! 所有规则在扣款之前执行，校验失败不产生任何资金变动。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// 订单金额容差
///
/// 客户端提交的 total_points 与服务端计算值允许相差 ±1，
/// 吸收前端按比例折算时的舍入误差。
pub const COST_TOLERANCE: i64 = 1;

/// 商品类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// 플레이스 트래픽（地图排名流量）
    Place,
    /// 영수증 리뷰（小票评价）
    Receipt,
    /// 카카오맵 리뷰（Kakao 地图评价）
    Kakaomap,
    /// 블로그 배포（博客分发）
    Blog,
    /// 카페 마케팅（社区咖啡馆营销）
    Cafe,
    /// 체험단（博主体验团）
    Experience,
}

impl ProductType {
    pub const ALL: [ProductType; 6] = [
        Self::Place,
        Self::Receipt,
        Self::Kakaomap,
        Self::Blog,
        Self::Cafe,
        Self::Experience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Receipt => "receipt",
            Self::Kakaomap => "kakaomap",
            Self::Blog => "blog",
            Self::Cafe => "cafe",
            Self::Experience => "experience",
        }
    }

    /// 该商品的订单表名（每种商品一张表）
    pub fn submission_table(&self) -> &'static str {
        match self {
            Self::Place => "place_submissions",
            Self::Receipt => "receipt_submissions",
            Self::Kakaomap => "kakaomap_submissions",
            Self::Blog => "blog_submissions",
            Self::Cafe => "cafe_submissions",
            Self::Experience => "experience_submissions",
        }
    }

    /// 该商品的内容条目表名（无交付内容的商品返回 None）
    pub fn content_table(&self) -> Option<&'static str> {
        match self {
            Self::Blog => Some("blog_content_items"),
            Self::Cafe => Some("cafe_content_items"),
            Self::Kakaomap => Some("kakaomap_content_items"),
            _ => None,
        }
    }

    /// 是否按日记录交付进度
    pub fn tracks_daily_records(&self) -> bool {
        matches!(self, Self::Place | Self::Blog | Self::Cafe | Self::Kakaomap)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "place" => Ok(Self::Place),
            "receipt" => Ok(Self::Receipt),
            "kakaomap" => Ok(Self::Kakaomap),
            "blog" => Ok(Self::Blog),
            "cafe" => Ok(Self::Cafe),
            "experience" => Ok(Self::Experience),
            other => Err(LifecycleError::UnknownProduct(other.to_string())),
        }
    }
}

/// 商品单价表（积分/单位）
///
/// 默认值来自运营定价，可在配置层整体替换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub place_per_visit: i64,
    pub receipt_per_review: i64,
    pub kakaomap_per_review: i64,
    pub blog_per_post: i64,
    pub cafe_per_post: i64,
    pub experience_per_blogger: i64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            place_per_visit: 50,
            receipt_per_review: 15_000,
            kakaomap_per_review: 12_000,
            blog_per_post: 30_000,
            cafe_per_post: 20_000,
            experience_per_blogger: 100_000,
        }
    }
}

impl PriceTable {
    /// 商品单价
    pub fn unit_price(&self, product: ProductType) -> i64 {
        match product {
            ProductType::Place => self.place_per_visit,
            ProductType::Receipt => self.receipt_per_review,
            ProductType::Kakaomap => self.kakaomap_per_review,
            ProductType::Blog => self.blog_per_post,
            ProductType::Cafe => self.cafe_per_post,
            ProductType::Experience => self.experience_per_blogger,
        }
    }
}

/// 各商品的下单数量参数
///
/// 校验规则（超出范围的订单在任何资金变动前被拒绝）：
/// - blog: 1 ≤ daily_count ≤ 3, 1 ≤ total_count ≤ 30
/// - place: daily_count ≥ 100, 3 ≤ days ≤ 7
/// - receipt/kakaomap: review_count ≥ 1
/// - cafe: post_count ≥ 1
/// - experience: blogger_count ≥ 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum OrderSpec {
    Place { daily_count: u32, days: u32 },
    Receipt { review_count: u32 },
    Kakaomap { review_count: u32 },
    Blog { daily_count: u32, total_count: u32 },
    Cafe { post_count: u32 },
    Experience { blogger_count: u32 },
}

impl OrderSpec {
    pub fn product(&self) -> ProductType {
        match self {
            Self::Place { .. } => ProductType::Place,
            Self::Receipt { .. } => ProductType::Receipt,
            Self::Kakaomap { .. } => ProductType::Kakaomap,
            Self::Blog { .. } => ProductType::Blog,
            Self::Cafe { .. } => ProductType::Cafe,
            Self::Experience { .. } => ProductType::Experience,
        }
    }

    /// 数量范围校验
    pub fn validate(&self) -> Result<(), LifecycleError> {
        match *self {
            Self::Place { daily_count, days } => {
                if daily_count < 100 {
                    return Err(invalid("daily_count", "플레이스 일 방문수는 100 이상"));
                }
                if !(3..=7).contains(&days) {
                    return Err(invalid("days", "집행 일수는 3~7일"));
                }
            }
            Self::Blog {
                daily_count,
                total_count,
            } => {
                if !(1..=3).contains(&daily_count) {
                    return Err(invalid("daily_count", "일 발행수는 1~3건"));
                }
                if !(1..=30).contains(&total_count) {
                    return Err(invalid("total_count", "총 발행수는 1~30건"));
                }
            }
            Self::Receipt { review_count } | Self::Kakaomap { review_count } => {
                if review_count < 1 {
                    return Err(invalid("review_count", "리뷰 수는 1 이상"));
                }
            }
            Self::Cafe { post_count } => {
                if post_count < 1 {
                    return Err(invalid("post_count", "게시글 수는 1 이상"));
                }
            }
            Self::Experience { blogger_count } => {
                if blogger_count < 1 {
                    return Err(invalid("blogger_count", "블로거 수는 1 이상"));
                }
            }
        }
        Ok(())
    }

    /// 订单总交付单位数（退款比例与进度百分比的分母）
    pub fn total_units(&self) -> i64 {
        match *self {
            Self::Place { daily_count, days } => daily_count as i64 * days as i64,
            Self::Receipt { review_count } | Self::Kakaomap { review_count } => review_count as i64,
            Self::Blog { total_count, .. } => total_count as i64,
            Self::Cafe { post_count } => post_count as i64,
            Self::Experience { blogger_count } => blogger_count as i64,
        }
    }

    /// 服务端计算的订单金额
    pub fn expected_cost(&self, prices: &PriceTable) -> i64 {
        self.total_units() * prices.unit_price(self.product())
    }
}

fn invalid(field: &str, message: &str) -> LifecycleError {
    LifecycleError::InvalidOrder {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// 金额容差检查
///
/// 先做数量校验，再比较客户端提交金额与服务端计算值，
/// 相差超过 ±1 即拒绝。返回服务端计算的应扣金额。
pub fn check_cost(
    spec: &OrderSpec,
    prices: &PriceTable,
    submitted_total: i64,
) -> Result<i64, LifecycleError> {
    spec.validate()?;
    let expected = spec.expected_cost(prices);
    if (submitted_total - expected).abs() > COST_TOLERANCE {
        return Err(LifecycleError::CostMismatch {
            expected,
            submitted: submitted_total,
        });
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_order_boundaries() {
        // 边界值必须接受
        assert!(OrderSpec::Blog { daily_count: 1, total_count: 30 }.validate().is_ok());
        assert!(OrderSpec::Blog { daily_count: 3, total_count: 30 }.validate().is_ok());
        assert!(OrderSpec::Blog { daily_count: 2, total_count: 1 }.validate().is_ok());

        // 越界必须拒绝
        assert!(OrderSpec::Blog { daily_count: 0, total_count: 10 }.validate().is_err());
        assert!(OrderSpec::Blog { daily_count: 4, total_count: 10 }.validate().is_err());
        assert!(OrderSpec::Blog { daily_count: 2, total_count: 31 }.validate().is_err());
        assert!(OrderSpec::Blog { daily_count: 2, total_count: 0 }.validate().is_err());
    }

    #[test]
    fn test_place_order_boundaries() {
        assert!(OrderSpec::Place { daily_count: 100, days: 3 }.validate().is_ok());
        assert!(OrderSpec::Place { daily_count: 500, days: 7 }.validate().is_ok());

        assert!(OrderSpec::Place { daily_count: 99, days: 5 }.validate().is_err());
        assert!(OrderSpec::Place { daily_count: 100, days: 2 }.validate().is_err());
        assert!(OrderSpec::Place { daily_count: 100, days: 8 }.validate().is_err());
    }

    #[test]
    fn test_total_units() {
        assert_eq!(OrderSpec::Place { daily_count: 100, days: 5 }.total_units(), 500);
        assert_eq!(OrderSpec::Blog { daily_count: 2, total_count: 20 }.total_units(), 20);
        assert_eq!(OrderSpec::Receipt { review_count: 7 }.total_units(), 7);
    }

    #[test]
    fn test_cost_tolerance() {
        let prices = PriceTable::default();
        let spec = OrderSpec::Receipt { review_count: 3 };
        let expected = 3 * prices.receipt_per_review;

        // 精确值和 ±1 都接受
        assert_eq!(check_cost(&spec, &prices, expected), Ok(expected));
        assert_eq!(check_cost(&spec, &prices, expected + 1), Ok(expected));
        assert_eq!(check_cost(&spec, &prices, expected - 1), Ok(expected));

        // 相差 2 拒绝
        assert_eq!(
            check_cost(&spec, &prices, expected + 2),
            Err(LifecycleError::CostMismatch {
                expected,
                submitted: expected + 2
            })
        );
    }

    #[test]
    fn test_check_cost_rejects_invalid_quantity_before_amount() {
        let prices = PriceTable::default();
        let spec = OrderSpec::Blog { daily_count: 4, total_count: 10 };
        // 数量非法时无论金额是否正确都应拒绝
        assert!(matches!(
            check_cost(&spec, &prices, 300_000),
            Err(LifecycleError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_product_string_round_trip() {
        for product in ProductType::ALL {
            assert_eq!(product.as_str().parse::<ProductType>(), Ok(product));
        }
        assert!("instagram".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_content_table_mapping() {
        assert_eq!(ProductType::Blog.content_table(), Some("blog_content_items"));
        assert_eq!(ProductType::Place.content_table(), None);
        assert_eq!(ProductType::Experience.content_table(), None);
    }
}
