//! API 服务 DTO 模块
//!
//! 包含所有请求和响应的数据传输对象

pub mod request;
pub mod response;

// 重新导出常用类型
pub use request::{
    AdminLoginRequest, ChargePointsRequest, ClientFilter, CreateBlogOrderRequest,
    CreateCafeOrderRequest, CreateClientRequest, CreateContentItemRequest,
    CreateExperienceOrderRequest, CreateKakaomapOrderRequest, CreatePlaceOrderRequest,
    CreateReceiptOrderRequest, DailyRecordRequest, NotificationFilter, PaginationParams,
    RegisterBloggersRequest, RevisionRequest, SelectBloggersRequest, StatusEventRequest,
    TransactionFilter, UpdateClientStatusRequest,
};

pub use response::{
    ApiResponse, BloggerDto, ClientDto, ContentItemDto, DailyRecordDto, NotificationDto,
    OrderCreatedDto, PageResponse, ProductStatsDto, SessionUserDto, StatsOverview, SubmissionDto,
};
