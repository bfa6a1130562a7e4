//! Solidity bindings for the vault and its asset.
//!
//! The vault is a pre-deployed, audited multi-strategy ERC-4626 contract;
//! only the functions this backend reads or submits are declared.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IVault {
        // ERC-4626 views
        function asset() external view returns (address);
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function convertToAssets(uint256 shares) external view returns (uint256);
        function convertToShares(uint256 assets) external view returns (uint256);

        // Vault accounting
        function totalIdle() external view returns (uint256);
        function totalDebt() external view returns (uint256);
        function deposit_limit() external view returns (uint256);
        function strategies(address strategy) external view returns (
            uint256 activation,
            uint256 last_report,
            uint256 current_debt,
            uint256 max_debt
        );
        function get_default_queue() external view returns (address[] memory);

        // Roles
        function roles(address account) external view returns (uint256);
        function role_manager() external view returns (address);

        // ERC-4626 deposit / withdraw
        function deposit(uint256 assets, address receiver) external returns (uint256);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256);
        function redeem(uint256 shares, address receiver, address owner) external returns (uint256);

        // Management
        function add_strategy(address new_strategy) external;
        function update_debt(address strategy, uint256 target_debt) external returns (uint256);
        function update_max_debt_for_strategy(address strategy, uint256 new_max_debt) external;
        function process_report(address strategy) external returns (uint256, uint256);
        function set_deposit_limit(uint256 deposit_limit) external;
        function set_role(address account, uint256 role) external;
        function add_role(address account, uint256 role) external;
        function remove_role(address account, uint256 role) external;

        function initialize(
            address asset,
            string calldata name,
            string calldata symbol,
            address role_manager,
            uint256 profit_max_unlock_time
        ) external;
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}
