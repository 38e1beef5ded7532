// ==========================================
// 化妆品生产批次计划系统 - 生产订单 API
// ==========================================
// 职责: 订单生命周期处理器（创建/排产/确认/人工处理/复制/查询）
// 红线: 每个处理器一次加载、一次保存；不做重试
// 红线: ERP 提交失败不向调用方抛错，转成 manual_action_required
// ==========================================

use crate::api::dto::{
    AddNoteRequest, ConfirmProductCompletionRequest, ConfirmSemiProductRequest,
    ConfirmSinglePhaseRequest, ConfirmSinglePhaseResponse, CreateManufactureOrderRequest,
    CreateManufactureOrderResponse, DuplicateOrderResponse, ListOrdersRequest, OrderSummary,
    PlanOrderRequest, ResolveManualActionRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::config::PlanningConfig;
use crate::domain::order::{
    ManufactureOrder, ManufactureOrderProduct, ManufactureOrderSemiProduct,
};
use crate::domain::types::ErpDocumentType;
use crate::erp::{DiscardResidualRequest, ManufactureClient, SubmitManufactureRequest};
use crate::identity::CurrentUserProvider;
use crate::repository::order_repo::{ManufactureOrderRepository, OrderFilter};
use chrono::Datelike;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// OrderApi - 生产订单 API
// ==========================================
pub struct OrderApi {
    order_repo: Arc<ManufactureOrderRepository>,
    erp_client: Arc<dyn ManufactureClient>,
    user_provider: Arc<dyn CurrentUserProvider>,
    clock: Arc<dyn Clock>,
    config: PlanningConfig,
}

impl OrderApi {
    /// 创建新的 OrderApi 实例
    pub fn new(
        order_repo: Arc<ManufactureOrderRepository>,
        erp_client: Arc<dyn ManufactureClient>,
        user_provider: Arc<dyn CurrentUserProvider>,
        clock: Arc<dyn Clock>,
        config: PlanningConfig,
    ) -> Self {
        Self {
            order_repo,
            erp_client,
            user_provider,
            clock,
            config,
        }
    }

    // ==========================================
    // 创建 / 排产
    // ==========================================

    /// 从批次计划结果创建草稿订单（不调用 ERP）
    pub fn create_order(
        &self,
        request: &CreateManufactureOrderRequest,
    ) -> ApiResult<CreateManufactureOrderResponse> {
        if request.new_batch_size <= 0.0 {
            return Err(ApiError::ValidationError(format!(
                "批量必须为正: {}",
                request.new_batch_size
            )));
        }
        if request.products.is_empty() {
            return Err(ApiError::ValidationError(
                "订单必须至少包含一个成品行".to_string(),
            ));
        }
        for line in &request.products {
            if line.planned_quantity < 0.0 {
                return Err(ApiError::ValidationError(format!(
                    "成品行计划数量不能为负: {} = {}",
                    line.product_code, line.planned_quantity
                )));
            }
        }

        let now = self.clock.now();
        let user = self.user_provider.current_user();
        let order_number = self
            .order_repo
            .generate_order_number(&self.config.order_number_prefix, now.date().year())?;

        let semi_product = ManufactureOrderSemiProduct {
            product_code: request.product_code.clone(),
            product_name: request.product_name.clone(),
            planned_quantity: request.new_batch_size,
            actual_quantity: None,
            lot_number: None,
            expiration_date: None,
            expiration_months: self.config.default_expiration_months,
            batch_multiplier: request.scale_factor,
        };
        let products = request
            .products
            .iter()
            .map(|line| ManufactureOrderProduct {
                id: uuid::Uuid::new_v4().to_string(),
                product_code: line.product_code.clone(),
                product_name: line.product_name.clone(),
                planned_quantity: line.planned_quantity,
                actual_quantity: None,
                lot_number: None,
                expiration_date: None,
                expiration_months: line.expiration_months,
                batch_multiplier: request.scale_factor,
            })
            .collect();

        let order = ManufactureOrder::create(
            order_number.clone(),
            semi_product,
            products,
            request.manufacture_type,
            request.responsible_person.clone(),
            request.planned_date,
            Some((
                request.original_batch_size,
                request.new_batch_size,
                request.scale_factor,
            )),
            now,
            &user.name,
        );
        let id = self.order_repo.add_order(&order)?;
        info!(order_number = %order_number, order_id = %id, "manufacture order created");
        Ok(CreateManufactureOrderResponse {
            id,
            order_number,
        })
    }

    /// 排产: DRAFT → PLANNED
    pub fn plan_order(&self, request: &PlanOrderRequest) -> ApiResult<()> {
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        order.plan(
            request.planned_date_semiproduct,
            request.planned_date_product,
            now,
            &user.name,
        )?;
        self.order_repo.update_order(&order)?;
        Ok(())
    }

    // ==========================================
    // 确认
    // ==========================================

    /// 单阶段生产确认: PLANNED → IN_PRODUCTION → COMPLETED（同一调用内）
    ///
    /// 前置条件不满足（订单不存在 / 制造类型不符 / 状态不符）返回类型化错误，
    /// 聚合保持不变。
    pub fn confirm_single_phase(
        &self,
        request: &ConfirmSinglePhaseRequest,
    ) -> ApiResult<ConfirmSinglePhaseResponse> {
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        // 审计署名优先使用请求指定的 user_id
        let actor = request.user_id.as_deref().unwrap_or(&user.name);
        order.confirm_single_phase(
            &request.product_actual_quantities,
            request.change_reason.as_deref(),
            &self.config.lot_number_prefix,
            now,
            actor,
        )?;
        self.order_repo.update_order(&order)?;
        info!(order_id = %order.id, "single phase production confirmed");
        Ok(ConfirmSinglePhaseResponse {
            order_id: order.id,
            completed_at: now,
        })
    }

    /// 双阶段 - 半成品阶段确认: PLANNED → SEMI_PRODUCT_MANUFACTURED
    ///
    /// 状态推进后向 ERP 提交半成品生产单；提交失败不报错，
    /// 而是置 manual_action_required，由人工处理通道收尾。
    pub async fn confirm_semiproduct_manufacture(
        &self,
        request: &ConfirmSemiProductRequest,
    ) -> ApiResult<()> {
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        order.confirm_semi_product(
            request.actual_quantity,
            request.lot_number.clone(),
            &request.change_reason,
            &self.config.lot_number_prefix,
            now,
            &user.name,
        )?;

        let erp_request = SubmitManufactureRequest {
            order_number: order.order_number.clone(),
            document_type: ErpDocumentType::SemiProductOrder,
            product_code: order.semi_product.product_code.clone(),
            product_name: order.semi_product.product_name.clone(),
            quantity: request.actual_quantity,
            lot_number: order.semi_product.lot_number.clone(),
            planned_date: order.planned_date_semiproduct,
        };
        match self.erp_client.submit_manufacture(&erp_request).await {
            Ok(response) => {
                order.set_erp_order(
                    ErpDocumentType::SemiProductOrder,
                    response.erp_order_number,
                    response.order_date,
                    now,
                    &user.name,
                );
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "semi-product ERP submission failed");
                order.flag_manual_action(
                    &format!("半成品生产单 ERP 提交失败: {}", e),
                    now,
                    &user.name,
                );
            }
        }
        self.order_repo.update_order(&order)?;
        Ok(())
    }

    /// 双阶段 - 成品阶段确认: SEMI_PRODUCT_MANUFACTURED → COMPLETED
    ///
    /// 可选申请报废残余半成品；ERP 要求人工审批时置 manual_action_required。
    pub async fn confirm_product_completion(
        &self,
        request: &ConfirmProductCompletionRequest,
    ) -> ApiResult<()> {
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        order.confirm_product_completion(
            &request.product_actual_quantities,
            &request.change_reason,
            &self.config.lot_number_prefix,
            now,
            &user.name,
        )?;

        let erp_request = SubmitManufactureRequest {
            order_number: order.order_number.clone(),
            document_type: ErpDocumentType::ProductOrder,
            product_code: order.semi_product.product_code.clone(),
            product_name: order.semi_product.product_name.clone(),
            quantity: order
                .products
                .iter()
                .filter_map(|p| p.actual_quantity)
                .sum(),
            lot_number: order.semi_product.lot_number.clone(),
            planned_date: order.planned_date_product,
        };
        match self.erp_client.submit_manufacture(&erp_request).await {
            Ok(response) => {
                order.set_erp_order(
                    ErpDocumentType::ProductOrder,
                    response.erp_order_number,
                    response.order_date,
                    now,
                    &user.name,
                );
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "product ERP submission failed");
                order.flag_manual_action(
                    &format!("成品生产单 ERP 提交失败: {}", e),
                    now,
                    &user.name,
                );
            }
        }

        if request.discard_residual_semiproduct {
            let discard_request = DiscardResidualRequest {
                semiproduct_code: order.semi_product.product_code.clone(),
                lot_number: order.semi_product.lot_number.clone(),
                quantity_to_discard: order
                    .semi_product
                    .actual_quantity
                    .unwrap_or(order.semi_product.planned_quantity),
            };
            match self
                .erp_client
                .discard_residual_semiproduct(&discard_request)
                .await
            {
                Ok(response) if response.requires_manual_approval => {
                    order.flag_manual_action(
                        &format!(
                            "残余半成品报废需人工审批: found={} discarded={}",
                            response.quantity_found, response.quantity_discarded
                        ),
                        now,
                        &user.name,
                    );
                }
                Ok(response) => {
                    if let Some(reference) = response.stock_movement_reference {
                        order.add_note(
                            format!("残余半成品已报废，库存移动单: {}", reference),
                            now,
                            &user.name,
                        );
                    }
                }
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "residual discard failed");
                    order.flag_manual_action(
                        &format!("残余半成品报废失败: {}", e),
                        now,
                        &user.name,
                    );
                }
            }
        }
        self.order_repo.update_order(&order)?;
        Ok(())
    }

    // ==========================================
    // 人工处理 / 备注
    // ==========================================

    /// 人工处理完成: 写入 ERP 关联、清除标志、可选备注；不改变状态
    pub fn resolve_manual_action(&self, request: &ResolveManualActionRequest) -> ApiResult<()> {
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        order.resolve_manual_action(
            request.erp_order_number_semiproduct.clone(),
            request.erp_order_number_product.clone(),
            request.note.clone(),
            now,
            &user.name,
        );
        self.order_repo.update_order(&order)?;
        Ok(())
    }

    /// 添加自由文本备注
    pub fn add_note(&self, request: &AddNoteRequest) -> ApiResult<()> {
        if request.text.trim().is_empty() {
            return Err(ApiError::InvalidInput("备注内容不能为空".to_string()));
        }
        let mut order = self.order_repo.get_order_by_id(&request.order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        order.add_note(request.text.clone(), now, &user.name);
        self.order_repo.update_order(&order)?;
        Ok(())
    }

    // ==========================================
    // 复制
    // ==========================================

    /// 从任意状态的源订单复制出新草稿
    ///
    /// 新订单号、新批号、实际数量重置为计划数量，与源订单历史无关。
    pub fn duplicate_order(&self, order_id: &str) -> ApiResult<DuplicateOrderResponse> {
        let source = self.order_repo.get_order_by_id(order_id)?;
        let now = self.clock.now();
        let user = self.user_provider.current_user();
        let order_number = self
            .order_repo
            .generate_order_number(&self.config.order_number_prefix, now.date().year())?;
        let copy = source.duplicate(
            order_number.clone(),
            &self.config.lot_number_prefix,
            now,
            &user.name,
        );
        let id = self.order_repo.add_order(&copy)?;
        info!(source_order = %source.order_number, new_order = %order_number, "order duplicated");
        Ok(DuplicateOrderResponse { id, order_number })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按 ID 读取完整订单聚合
    pub fn get_order(&self, order_id: &str) -> ApiResult<ManufactureOrder> {
        Ok(self.order_repo.get_order_by_id(order_id)?)
    }

    /// 按条件列出订单
    pub fn list_orders(&self, request: &ListOrdersRequest) -> ApiResult<Vec<OrderSummary>> {
        let orders = self.order_repo.list_orders(&OrderFilter {
            state: request.state,
            manufacture_type: request.manufacture_type,
            manual_action_required: request.manual_action_required,
            responsible_person: request.responsible_person.clone(),
            created_from: request.created_from,
            created_to: request.created_to,
        })?;
        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                id: o.id,
                order_number: o.order_number,
                created_date: o.created_date,
                responsible_person: o.responsible_person,
                manufacture_type: o.manufacture_type,
                state: o.status.state,
                manual_action_required: o.status.manual_action_required,
                erp_order_number_semiproduct: o.erp_order_number_semiproduct,
                erp_order_number_product: o.erp_order_number_product,
            })
            .collect())
    }
}
